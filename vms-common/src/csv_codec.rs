//! CSV import/export codec
//!
//! Import reads the whole upload at once; there is no incremental parsing.
//! Rows keep their 1-based position with the header as row 1, so error
//! reports line up with what a spreadsheet shows.

use crate::voucher::{Voucher, DATE_FORMAT};
use crate::{Error, Result};

/// Header written on export
pub const EXPORT_HEADER: [&str; 3] = ["voucher_code", "discount_percent", "expiry_date"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One parsed record with its position in the file
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    /// 1-based; the header is row 1
    pub row_number: usize,
    pub fields: Vec<String>,
}

impl CsvRow {
    /// Field at `index`, or `None` when the row is too short
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

/// Parse every record in `bytes`, header included
///
/// Records may have differing lengths; column count is a per-row concern of
/// the caller. Blank lines are skipped and do not consume a row number.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<CsvRow>> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| Error::MalformedInput(format!("failed to read CSV file: {}", e)))?;
        rows.push(CsvRow {
            row_number: index + 1,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(rows)
}

/// Encode vouchers as CSV in the given order
///
/// Discount is written with exactly two decimals and the date with the same
/// fixed format accepted on import.
pub fn write_export(vouchers: &[Voucher]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| Error::Internal(format!("failed to write CSV header: {}", e)))?;

    for voucher in vouchers {
        writer
            .write_record([
                voucher.voucher_code.clone(),
                format!("{:.2}", voucher.discount_percent),
                voucher.expiry_date.format(DATE_FORMAT).to_string(),
            ])
            .map_err(|e| Error::Internal(format!("failed to write CSV row: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("failed to flush CSV writer: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn voucher(id: i64, code: &str, discount: f64, date: (i32, u32, u32)) -> Voucher {
        let ts = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        Voucher {
            id,
            voucher_code: code.to_string(),
            discount_percent: discount,
            expiry_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            created_at: ts,
            updated_at: ts,
            deleted_at: None,
        }
    }

    #[test]
    fn test_parse_numbers_rows_from_header() {
        let input = b"voucher_code,discount_percent,expiry_date\nA,10,2099-01-01\nB,20,2099-01-01\n";
        let rows = parse_records(input).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[1].row_number, 2);
        assert_eq!(rows[1].fields, vec!["A", "10", "2099-01-01"]);
        assert_eq!(rows[2].row_number, 3);
    }

    #[test]
    fn test_parse_accepts_short_rows_and_quotes() {
        let input = b"h1,h2,h3\nonly_one\n\"WITH,COMMA\",5,2099-01-01\n";
        let rows = parse_records(input).unwrap();
        assert_eq!(rows[1].fields, vec!["only_one"]);
        assert_eq!(rows[1].field(1), None);
        assert_eq!(rows[2].field(0), Some("WITH,COMMA"));
    }

    #[test]
    fn test_parse_strips_bom_and_crlf() {
        let input = b"\xEF\xBB\xBFvoucher_code,discount_percent,expiry_date\r\nA,10,2099-01-01\r\n";
        let rows = parse_records(input).unwrap();
        assert_eq!(rows[0].fields[0], "voucher_code");
        assert_eq!(rows[1].fields, vec!["A", "10", "2099-01-01"]);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_records(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_utf8_is_malformed() {
        let result = parse_records(b"code,discount,date\n\xFF\xFE,10,2099-01-01\n");
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_export_format() {
        let vouchers = vec![
            voucher(1, "DISC10", 10.0, (2099, 1, 1)),
            voucher(2, "HALF", 49.999, (2099, 12, 31)),
        ];
        let bytes = write_export(&vouchers).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "voucher_code,discount_percent,expiry_date\nDISC10,10.00,2099-01-01\nHALF,50.00,2099-12-31\n"
        );
    }

    #[test]
    fn test_export_header_only_when_empty() {
        let text = String::from_utf8(write_export(&[]).unwrap()).unwrap();
        assert_eq!(text, "voucher_code,discount_percent,expiry_date\n");
    }

    #[test]
    fn test_export_then_parse_preserves_fields() {
        let vouchers = vec![voucher(1, "Q,UOTED", 12.5, (2099, 3, 4))];
        let bytes = write_export(&vouchers).unwrap();
        let rows = parse_records(&bytes).unwrap();
        assert_eq!(rows[1].fields, vec!["Q,UOTED", "12.50", "2099-03-04"]);
    }
}
