//! # VMS Common Library
//!
//! Shared code for the voucher management service:
//! - Voucher entity and candidate shapes
//! - Field validation rules
//! - CSV import/export codec
//! - Repository contract and SQLite implementation
//! - Database initialization
//! - Bootstrap configuration loading
//! - Access token signing and verification

pub mod auth;
pub mod config;
pub mod csv_codec;
pub mod db;
pub mod error;
pub mod pagination;
pub mod repository;
pub mod validation;
pub mod voucher;

pub use error::{Error, Result};
pub use repository::{SqliteVoucherRepository, VoucherRepository};
pub use validation::ValidationError;
pub use voucher::{NewVoucher, Voucher, VoucherCandidate};
