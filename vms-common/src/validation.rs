//! Voucher field validation
//!
//! Pure rule checks for a single candidate. Nothing here touches storage;
//! code uniqueness is resolved by the caller.
//!
//! Rules run in a fixed order and stop at the first violation:
//! code, then discount, then expiry date (format before range).

use crate::voucher::{
    NewVoucher, VoucherCandidate, DATE_FORMAT, MAX_CODE_LENGTH, MAX_DISCOUNT_PERCENT,
    MIN_DISCOUNT_PERCENT,
};
use chrono::NaiveDate;
use thiserror::Error;

/// Field-level rejection reasons
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("voucher code is required")]
    EmptyCode,

    #[error("voucher code exceeds 50 characters")]
    CodeTooLong,

    #[error("invalid discount percent '{0}': must be a number")]
    NotANumber(String),

    #[error("discount percent {0:.2} out of range (must be 1-100)")]
    DiscountOutOfRange(f64),

    #[error("invalid date format '{0}': expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("expiry date {0} must be today or in the future")]
    ExpiryInPast(String),

    #[error("insufficient columns (expected 3: voucher_code, discount_percent, expiry_date)")]
    InsufficientColumns,
}

/// Today's date in local time, truncated to the day
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Check code presence and length (in characters)
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::CodeTooLong);
    }
    Ok(())
}

/// Parse a discount from its text form
///
/// `NaN` and infinities parse as floats but are not numbers for our purposes.
pub fn parse_discount(raw: &str) -> Result<f64, ValidationError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::NotANumber(raw.to_string())),
    }
}

/// Check the inclusive discount range [1, 100]
pub fn check_discount(value: f64) -> Result<f64, ValidationError> {
    if !(MIN_DISCOUNT_PERCENT..=MAX_DISCOUNT_PERCENT).contains(&value) {
        return Err(ValidationError::DiscountOutOfRange(value));
    }
    Ok(value)
}

/// Parse `YYYY-MM-DD` strictly: four-digit year, two-digit month and day
pub fn parse_expiry_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(ValidationError::InvalidDateFormat(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDateFormat(raw.to_string()))
}

/// Reject dates strictly before `today`; `today` itself is accepted
pub fn check_expiry(date: NaiveDate, raw: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if date < today {
        return Err(ValidationError::ExpiryInPast(raw.to_string()));
    }
    Ok(date)
}

/// Validate a typed candidate (JSON create/update and batch rows)
pub fn validate_candidate(
    candidate: &VoucherCandidate,
    today: NaiveDate,
) -> Result<NewVoucher, ValidationError> {
    validate_code(&candidate.voucher_code)?;
    let discount_percent = check_discount(candidate.discount_percent)?;
    let expiry_date = parse_expiry_date(&candidate.expiry_date)?;
    let expiry_date = check_expiry(expiry_date, &candidate.expiry_date, today)?;

    Ok(NewVoucher {
        voucher_code: candidate.voucher_code.clone(),
        discount_percent,
        expiry_date,
    })
}

/// Validate the discount and date cells of a CSV row
///
/// Cells are trimmed before parsing. The code cell is checked separately by
/// the import pipeline because a storage lookup sits between the two steps.
pub fn validate_csv_values(
    discount_raw: &str,
    date_raw: &str,
    today: NaiveDate,
) -> Result<(f64, NaiveDate), ValidationError> {
    let discount_raw = discount_raw.trim();
    let discount = check_discount(parse_discount(discount_raw)?)?;

    let date_raw = date_raw.trim();
    let date = parse_expiry_date(date_raw)?;
    let date = check_expiry(date, date_raw, today)?;

    Ok((discount, date))
}
