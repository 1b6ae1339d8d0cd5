//! Database schema and connection setup

pub mod init;

pub use init::{create_vouchers_table, init_database};
