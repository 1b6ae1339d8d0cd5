//! Bulk voucher ingestion
//!
//! Two entry points share the same validation rules:
//! - CSV upload: per-row report, row numbers as a spreadsheet shows them
//! - Structured batch: duplicate codes resolved in one lookup up front
//!
//! Rows are judged independently and failures never stop the run. Everything
//! that passes goes to storage in a single `insert_many` call. A storage
//! failure aborts the whole call instead.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use vms_common::csv_codec::{parse_records, CsvRow};
use vms_common::validation::{today_local, validate_candidate, validate_code, validate_csv_values};
use vms_common::{Error, NewVoucher, Result, ValidationError, VoucherCandidate, VoucherRepository};

use super::DuplicateResolver;

/// Most candidates accepted in one structured batch
pub const MAX_BATCH_SIZE: usize = 1000;

/// A rejected CSV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based file row; the header is row 1
    pub row: usize,
    pub error: String,
}

/// Outcome of a CSV import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    /// Data rows in the file (header excluded)
    pub total_rows: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

/// Outcome of a structured batch import
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub total_received: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub duplicate_codes: Vec<String>,
    /// `"code: reason"` per rejected candidate
    pub errors: Vec<String>,
}

/// Runs CSV and structured batch imports against the repository
#[derive(Clone)]
pub struct BatchImporter {
    repo: Arc<dyn VoucherRepository>,
    resolver: DuplicateResolver,
}

impl BatchImporter {
    pub fn new(repo: Arc<dyn VoucherRepository>) -> Self {
        let resolver = DuplicateResolver::new(Arc::clone(&repo));
        Self { repo, resolver }
    }

    /// Import vouchers from an uploaded CSV file
    ///
    /// The first row is a header and is never validated. An empty file or a
    /// header with no data rows fails the call with [`Error::EmptyImport`].
    pub async fn import_csv(&self, bytes: &[u8]) -> Result<ImportReport> {
        let rows = parse_records(bytes)?;
        if rows.len() < 2 {
            return Err(Error::EmptyImport);
        }
        let data_rows = &rows[1..];

        let today = today_local();
        let mut accepted: Vec<NewVoucher> = Vec::new();
        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut errors = Vec::new();

        for row in data_rows {
            match self.check_csv_row(row, &first_seen, today).await? {
                Ok(voucher) => {
                    first_seen.insert(voucher.voucher_code.clone(), row.row_number);
                    accepted.push(voucher);
                }
                Err(message) => {
                    debug!(row = row.row_number, error = %message, "Rejected CSV row");
                    errors.push(RowError {
                        row: row.row_number,
                        error: message,
                    });
                }
            }
        }

        let success = self.insert_accepted(&accepted).await?;

        let report = ImportReport {
            total_rows: data_rows.len(),
            success,
            failed: errors.len(),
            errors,
        };
        info!(
            total_rows = report.total_rows,
            success = report.success,
            failed = report.failed,
            "CSV import completed"
        );
        Ok(report)
    }

    /// Judge one data row
    ///
    /// The outer `Result` carries storage failures, which abort the import;
    /// the inner one is the row verdict.
    async fn check_csv_row(
        &self,
        row: &CsvRow,
        first_seen: &HashMap<String, usize>,
        today: chrono::NaiveDate,
    ) -> Result<std::result::Result<NewVoucher, String>> {
        let (code, discount_raw, date_raw) = match (row.field(0), row.field(1), row.field(2)) {
            (Some(code), Some(discount), Some(date)) => (code.trim(), discount, date),
            _ => return Ok(Err(ValidationError::InsufficientColumns.to_string())),
        };

        if let Err(e) = validate_code(code) {
            return Ok(Err(e.to_string()));
        }

        if self.repo.find_by_code(code).await?.is_some() {
            return Ok(Err(Error::DuplicateCode(code.to_string()).to_string()));
        }

        if let Some(first_row) = first_seen.get(code) {
            return Ok(Err(format!(
                "voucher code '{}' duplicates row {}",
                code, first_row
            )));
        }

        match validate_csv_values(discount_raw, date_raw, today) {
            Ok((discount_percent, expiry_date)) => Ok(Ok(NewVoucher {
                voucher_code: code.to_string(),
                discount_percent,
                expiry_date,
            })),
            Err(e) => Ok(Err(e.to_string())),
        }
    }

    /// Import a list of typed candidates
    ///
    /// Size limits are the caller's concern.
    pub async fn import_batch(&self, candidates: &[VoucherCandidate]) -> Result<BatchReport> {
        let codes: Vec<String> = candidates
            .iter()
            .map(|c| c.voucher_code.clone())
            .collect();
        let existing = self.resolver.resolve(&codes).await?;

        let today = today_local();
        let mut accepted: Vec<NewVoucher> = Vec::new();
        let mut accepted_codes = HashSet::new();
        let mut duplicate_codes = Vec::new();
        let mut errors = Vec::new();

        for candidate in candidates {
            let code = &candidate.voucher_code;
            if existing.contains(code) {
                duplicate_codes.push(code.clone());
                continue;
            }

            match validate_candidate(candidate, today) {
                Ok(voucher) => {
                    if !accepted_codes.insert(code.clone()) {
                        errors.push(format!(
                            "{}: voucher code '{}' appears more than once in this batch",
                            code, code
                        ));
                        continue;
                    }
                    accepted.push(voucher);
                }
                Err(e) => errors.push(format!("{}: {}", code, e)),
            }
        }

        let inserted = self.insert_accepted(&accepted).await?;

        let report = BatchReport {
            total_received: candidates.len(),
            inserted,
            duplicates: duplicate_codes.len(),
            duplicate_codes,
            errors,
        };
        info!(
            total_received = report.total_received,
            inserted = report.inserted,
            duplicates = report.duplicates,
            failed = report.errors.len(),
            "Batch import completed"
        );
        Ok(report)
    }

    async fn insert_accepted(&self, accepted: &[NewVoucher]) -> Result<usize> {
        if accepted.is_empty() {
            return Ok(0);
        }
        self.repo.insert_many(accepted).await?;
        Ok(accepted.len())
    }
}
