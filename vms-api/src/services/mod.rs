//! Voucher business logic
//!
//! Services depend only on the [`VoucherRepository`](vms_common::VoucherRepository)
//! contract and never on HTTP types.

pub mod batch_import;
pub mod duplicate_resolver;
pub mod voucher_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use batch_import::{BatchImporter, BatchReport, ImportReport, RowError, MAX_BATCH_SIZE};
pub use duplicate_resolver::DuplicateResolver;
pub use voucher_service::{VoucherPage, VoucherService};
