//! Type definitions module.
//!
//! Response models the DeBank client deserializes into, and the lightly
//! reshaped results the tools return.

pub mod analytics;
pub mod chain;
pub mod portfolio;
pub mod protocol;
pub mod token;
pub mod transaction;

pub use analytics::*;
pub use chain::*;
pub use portfolio::*;
pub use protocol::*;
pub use token::*;
pub use transaction::*;

use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::Serialize;

use crate::validation::Pagination;

/// Unknown upstream fields, passed through untouched.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// Convert an upstream USD figure for exact summation.
pub fn usd(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

/// Sum USD figures, rounded to cents.
pub fn sum_usd<I: IntoIterator<Item = f64>>(values: I) -> Decimal {
    values.into_iter().map(usd).sum::<Decimal>().round_dp(2)
}

/// Pagination details attached to locally paginated lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Items available upstream.
    pub total_count: usize,
    /// Items in this page.
    pub returned_count: usize,
    pub limit: u32,
    pub offset: u64,
    /// Whether items remain after this page.
    pub has_more: bool,
    /// Offset of the next page, if any.
    pub next_offset: Option<u64>,
}

impl PageInfo {
    /// Describe the page `page` selects out of `total_count` items.
    pub fn new(page: Pagination, total_count: usize) -> Self {
        let window = page.window(total_count);
        let has_more = window.end < total_count;
        Self {
            total_count,
            returned_count: window.len(),
            limit: page.limit,
            offset: page.offset,
            has_more,
            next_offset: has_more.then_some(window.end as u64),
        }
    }
}

/// Take the page `page` selects out of `items`.
pub fn paginate<T>(items: Vec<T>, page: Pagination) -> (Vec<T>, PageInfo) {
    let info = PageInfo::new(page, items.len());
    let window = page.window(items.len());
    let items = items.into_iter().skip(window.start).take(window.len()).collect();
    (items, info)
}
