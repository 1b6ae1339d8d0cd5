//! Batch existence check for voucher codes

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use vms_common::{Result, VoucherRepository};

/// Finds which codes of a batch are already taken by active vouchers
///
/// Always a single repository round trip per batch, whatever its size.
#[derive(Clone)]
pub struct DuplicateResolver {
    repo: Arc<dyn VoucherRepository>,
}

impl DuplicateResolver {
    pub fn new(repo: Arc<dyn VoucherRepository>) -> Self {
        Self { repo }
    }

    /// Subset of `codes` already used by active vouchers
    pub async fn resolve(&self, codes: &[String]) -> Result<HashSet<String>> {
        let mut seen = HashSet::with_capacity(codes.len());
        let unique: Vec<String> = codes
            .iter()
            .filter(|code| seen.insert(code.as_str()))
            .cloned()
            .collect();

        if unique.is_empty() {
            return Ok(HashSet::new());
        }

        let existing: HashSet<String> = self
            .repo
            .existing_codes_among(&unique)
            .await?
            .into_iter()
            .collect();

        debug!(checked = unique.len(), existing = existing.len(), "Resolved duplicate codes");
        Ok(existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{count, CountingRepository};

    #[tokio::test]
    async fn test_single_lookup_per_batch() {
        let repo = CountingRepository::new().await;
        repo.seed("TAKEN1").await;
        repo.seed("TAKEN2").await;
        let resolver = DuplicateResolver::new(repo.clone());

        let codes: Vec<String> = (0..250)
            .map(|i| format!("NEW{}", i))
            .chain(["TAKEN1".to_string(), "TAKEN2".to_string(), "TAKEN1".to_string()])
            .collect();
        let existing = resolver.resolve(&codes).await.unwrap();

        assert_eq!(count(&repo.calls.existing_codes_among), 1);
        assert_eq!(count(&repo.calls.find_by_code), 0);
        assert_eq!(existing.len(), 2);
        assert!(existing.contains("TAKEN1"));
        assert!(existing.contains("TAKEN2"));
    }

    #[tokio::test]
    async fn test_soft_deleted_code_is_not_a_duplicate() {
        let repo = CountingRepository::new().await;
        let old = repo.seed("REUSE").await;
        repo.soft_delete_by_id(old.id).await.unwrap();
        let resolver = DuplicateResolver::new(repo.clone());

        let existing = resolver.resolve(&["REUSE".to_string()]).await.unwrap();
        assert!(existing.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let repo = CountingRepository::new().await;
        let resolver = DuplicateResolver::new(repo.clone());

        assert!(resolver.resolve(&[]).await.unwrap().is_empty());
        assert_eq!(count(&repo.calls.existing_codes_among), 0);
    }
}
