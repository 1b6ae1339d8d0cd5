//! Single-voucher operations and export

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use vms_common::csv_codec::write_export;
use vms_common::pagination::{ListQuery, Pagination, SortField, SortOrder};
use vms_common::validation::{today_local, validate_candidate};
use vms_common::{Error, Result, Voucher, VoucherCandidate, VoucherRepository};

/// Upper bound on rows in one export
pub const EXPORT_LIMIT: i64 = 100_000;

/// One page of vouchers with its metadata
#[derive(Debug, Clone, Serialize)]
pub struct VoucherPage {
    pub vouchers: Vec<Voucher>,
    pub pagination: Pagination,
}

/// Create, read, update, delete and export vouchers
#[derive(Clone)]
pub struct VoucherService {
    repo: Arc<dyn VoucherRepository>,
}

fn not_found(id: i64) -> Error {
    Error::NotFound(format!("voucher {}", id))
}

impl VoucherService {
    pub fn new(repo: Arc<dyn VoucherRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<VoucherPage> {
        let (vouchers, total) = self.repo.find_paged(query).await?;
        Ok(VoucherPage {
            vouchers,
            pagination: Pagination::new(query, total),
        })
    }

    /// Fetch by id; soft-deleted vouchers only when `include_deleted`
    pub async fn get(&self, id: i64, include_deleted: bool) -> Result<Voucher> {
        let found = if include_deleted {
            self.repo.find_by_id_with_deleted(id).await?
        } else {
            self.repo.find_by_id(id).await?
        };
        found.ok_or_else(|| not_found(id))
    }

    async fn ensure_code_free(&self, code: &str) -> Result<()> {
        if self.repo.find_by_code(code).await?.is_some() {
            return Err(Error::DuplicateCode(code.to_string()));
        }
        Ok(())
    }

    pub async fn create(&self, candidate: &VoucherCandidate) -> Result<Voucher> {
        self.ensure_code_free(&candidate.voucher_code).await?;
        let validated = validate_candidate(candidate, today_local())?;

        let voucher = self.repo.insert_one(&validated).await?;
        info!(id = voucher.id, code = %voucher.voucher_code, "Created voucher");
        Ok(voucher)
    }

    /// Replace all three fields of an existing voucher
    ///
    /// The existence check must stay ahead of `update_one`, which would
    /// otherwise insert a new row for an unknown id.
    pub async fn update(&self, id: i64, candidate: &VoucherCandidate) -> Result<Voucher> {
        let mut voucher = self.repo.find_by_id(id).await?.ok_or_else(|| not_found(id))?;

        if candidate.voucher_code != voucher.voucher_code {
            self.ensure_code_free(&candidate.voucher_code).await?;
        } else {
            debug!(id, "Voucher code unchanged, skipping duplicate check");
        }

        let validated = validate_candidate(candidate, today_local())?;
        voucher.apply(validated);

        let updated = self.repo.update_one(&voucher).await?;
        info!(id, code = %updated.voucher_code, "Updated voucher");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.repo.find_by_id(id).await?.is_none() {
            return Err(not_found(id));
        }
        self.repo.soft_delete_by_id(id).await?;
        info!(id, "Soft-deleted voucher");
        Ok(())
    }

    /// All active vouchers as CSV, oldest first
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let query = ListQuery {
            page: 1,
            limit: EXPORT_LIMIT,
            search: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Asc,
        };
        let (vouchers, _) = self.repo.find_paged(&query).await?;
        let bytes = write_export(&vouchers)?;
        info!(rows = vouchers.len(), "Exported vouchers");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{count, CountingRepository};
    use vms_common::ValidationError;

    fn candidate(code: &str, discount: f64) -> VoucherCandidate {
        VoucherCandidate::new(code, discount, "2099-12-31")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = CountingRepository::new().await;
        let service = VoucherService::new(repo.clone());

        let created = service.create(&candidate("SAVE20", 20.0)).await.unwrap();
        assert_eq!(created.voucher_code, "SAVE20");
        assert_eq!(created.discount_percent, 20.0);
        assert!(created.is_active());

        let fetched = service.get(created.id, false).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate() {
        let repo = CountingRepository::new().await;
        repo.seed("TAKEN").await;
        let service = VoucherService::new(repo.clone());

        let err = service.create(&candidate("TAKEN", 20.0)).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateCode(ref c) if c == "TAKEN"));
        assert_eq!(count(&repo.calls.insert_one), 0);
    }

    #[tokio::test]
    async fn test_create_validation_failures() {
        let repo = CountingRepository::new().await;
        let service = VoucherService::new(repo.clone());

        let err = service.create(&candidate("BIG", 150.0)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::DiscountOutOfRange(_))));

        let past = VoucherCandidate::new("OLD", 10.0, "2000-01-01");
        let err = service.create(&past).await.unwrap_err();
        assert_eq!(err.to_string(), "expiry date 2000-01-01 must be today or in the future");

        let bad_date = VoucherCandidate::new("BAD", 10.0, "31/12/2099");
        let err = service.create(&bad_date).await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::InvalidDateFormat(_))));

        assert_eq!(count(&repo.calls.insert_one), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_id_never_persists() {
        let repo = CountingRepository::new().await;
        let service = VoucherService::new(repo.clone());

        let err = service.update(42, &candidate("X", 10.0)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(count(&repo.calls.update_one), 0);
        assert_eq!(repo.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_same_code_skips_duplicate_check() {
        let repo = CountingRepository::new().await;
        let existing = repo.seed("KEEP").await;
        let service = VoucherService::new(repo.clone());

        let updated = service
            .update(existing.id, &candidate("KEEP", 55.0))
            .await
            .unwrap();

        assert_eq!(updated.discount_percent, 55.0);
        assert_eq!(count(&repo.calls.find_by_code), 0);
        assert_eq!(count(&repo.calls.update_one), 1);
    }

    #[tokio::test]
    async fn test_update_to_taken_code_fails() {
        let repo = CountingRepository::new().await;
        let first = repo.seed("FIRST").await;
        repo.seed("SECOND").await;
        let service = VoucherService::new(repo.clone());

        let err = service
            .update(first.id, &candidate("SECOND", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCode(_)));
        assert_eq!(count(&repo.calls.update_one), 0);
    }

    #[tokio::test]
    async fn test_update_revalidates() {
        let repo = CountingRepository::new().await;
        let existing = repo.seed("CODE").await;
        let service = VoucherService::new(repo.clone());

        let err = service
            .update(existing.id, &candidate("", 10.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyCode)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = CountingRepository::new().await;
        let existing = repo.seed("BYE").await;
        let service = VoucherService::new(repo.clone());

        service.delete(existing.id).await.unwrap();
        assert!(matches!(service.get(existing.id, false).await, Err(Error::NotFound(_))));

        let deleted = service.get(existing.id, true).await.unwrap();
        assert!(deleted.deleted_at.is_some());

        // A second delete finds nothing and does not reach persistence
        let err = service.delete(existing.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(count(&repo.calls.soft_delete_by_id), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_makes_no_persistence_call() {
        let repo = CountingRepository::new().await;
        let service = VoucherService::new(repo.clone());

        assert!(matches!(service.delete(7).await, Err(Error::NotFound(_))));
        assert_eq!(count(&repo.calls.soft_delete_by_id), 0);
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let repo = CountingRepository::new().await;
        for i in 0..25 {
            repo.seed(&format!("V{:02}", i)).await;
        }
        let service = VoucherService::new(repo.clone());

        let query = ListQuery::from_params(Some(3), Some(10), None, None, None).unwrap();
        let page = service.list(&query).await.unwrap();
        assert_eq!(page.vouchers.len(), 5);
        assert_eq!(page.pagination.total, 25);
        assert_eq!(page.pagination.total_pages, 3);

        // Past the last page: empty, page echoed back
        let query = ListQuery::from_params(Some(9), Some(10), None, None, None).unwrap();
        let page = service.list(&query).await.unwrap();
        assert!(page.vouchers.is_empty());
        assert_eq!(page.pagination.page, 9);
    }

    #[tokio::test]
    async fn test_export_is_ordered_and_repeatable() {
        let repo = CountingRepository::new().await;
        let service = VoucherService::new(repo.clone());
        for code in ["FIRST", "SECOND", "THIRD"] {
            service.create(&candidate(code, 12.5)).await.unwrap();
        }
        let gone = service.create(&candidate("DELETED", 10.0)).await.unwrap();
        service.delete(gone.id).await.unwrap();

        let first = service.export_csv().await.unwrap();
        let second = service.export_csv().await.unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert_eq!(
            text,
            "voucher_code,discount_percent,expiry_date\n\
             FIRST,12.50,2099-12-31\n\
             SECOND,12.50,2099-12-31\n\
             THIRD,12.50,2099-12-31\n"
        );
    }
}
