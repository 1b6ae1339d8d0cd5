//! List query parameters and pagination metadata
//!
//! Sort fields come from a fixed whitelist so caller text never reaches SQL.

use crate::{Error, Result};
use serde::Serialize;

/// Page used when none (or an invalid one) is requested
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when none (or an invalid one) is requested
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size accepted from API callers
pub const MAX_LIMIT: i64 = 100;

/// Sortable voucher columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    VoucherCode,
    DiscountPercent,
    ExpiryDate,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse a caller-supplied field name; empty means the default
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim() {
            "" | "created_at" => Ok(SortField::CreatedAt),
            "id" => Ok(SortField::Id),
            "voucher_code" => Ok(SortField::VoucherCode),
            "discount_percent" => Ok(SortField::DiscountPercent),
            "expiry_date" => Ok(SortField::ExpiryDate),
            "updated_at" => Ok(SortField::UpdatedAt),
            other => Err(Error::InvalidInput(format!("Invalid sort field: {}", other))),
        }
    }

    /// Column name in the `vouchers` table
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::VoucherCode => "voucher_code",
            SortField::DiscountPercent => "discount_percent",
            SortField::ExpiryDate => "expiry_date",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc`/`desc` in any case; anything else falls back to descending
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameters for a paged voucher listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// 1-indexed
    pub page: i64,
    pub limit: i64,
    /// Case-insensitive substring of the voucher code
    pub search: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            search: None,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    /// Build a query from raw API parameters
    ///
    /// Missing or non-positive page/limit fall back to defaults and the limit
    /// is capped at [`MAX_LIMIT`]. Unknown sort fields are rejected.
    pub fn from_params(
        page: Option<i64>,
        limit: Option<i64>,
        search: Option<String>,
        sort_by: Option<&str>,
        sort_order: Option<&str>,
    ) -> Result<Self> {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            page,
            limit,
            search,
            sort: SortField::parse(sort_by.unwrap_or(""))?,
            order: sort_order.map(SortOrder::parse).unwrap_or_default(),
        })
    }

    /// Row offset for SQL `LIMIT/OFFSET`, saturating for huge pages
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned alongside a page of results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    /// Metadata for `total` matching rows at the query's page and limit
    ///
    /// The page is reported as requested, even past the last page.
    pub fn new(query: &ListQuery, total: i64) -> Self {
        let total_pages = (total + query.limit - 1) / query.limit;
        Self {
            page: query.page,
            limit: query.limit,
            total,
            total_pages,
        }
    }
}
