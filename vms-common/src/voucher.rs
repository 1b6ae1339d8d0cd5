//! Voucher entity and candidate shapes

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum voucher code length in characters
pub const MAX_CODE_LENGTH: usize = 50;

/// Lowest accepted discount percentage (inclusive)
pub const MIN_DISCOUNT_PERCENT: f64 = 1.0;

/// Highest accepted discount percentage (inclusive)
pub const MAX_DISCOUNT_PERCENT: f64 = 100.0;

/// Fixed calendar format used for parsing and exporting expiry dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persisted voucher record
///
/// `id` and the timestamps are owned by the repository. A non-null
/// `deleted_at` marks the voucher as soft-deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: i64,
    pub voucher_code: String,
    pub discount_percent: f64,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Voucher {
    /// Whether this voucher is visible to default queries
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Overwrite the mutable fields from a validated candidate
    pub fn apply(&mut self, validated: NewVoucher) {
        self.voucher_code = validated.voucher_code;
        self.discount_percent = validated.discount_percent;
        self.expiry_date = validated.expiry_date;
    }
}

/// Unvalidated voucher-shaped input (create, update and batch rows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherCandidate {
    pub voucher_code: String,
    pub discount_percent: f64,
    /// Expected as `YYYY-MM-DD`
    pub expiry_date: String,
}

impl VoucherCandidate {
    pub fn new(
        voucher_code: impl Into<String>,
        discount_percent: f64,
        expiry_date: impl Into<String>,
    ) -> Self {
        Self {
            voucher_code: voucher_code.into(),
            discount_percent,
            expiry_date: expiry_date.into(),
        }
    }
}

/// Validated candidate, ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewVoucher {
    pub voucher_code: String,
    pub discount_percent: f64,
    pub expiry_date: NaiveDate,
}
