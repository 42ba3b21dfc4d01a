//! Net curve, gas market and account usage types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Extra;

// ============================================================================
// Net Curve
// ============================================================================

/// Portfolio value at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetCurvePoint {
    pub timestamp: f64,
    pub usd_value: f64,
}

/// Direction of a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetCurveSummary {
    pub start_value_usd: f64,
    pub end_value_usd: f64,
    #[serde(with = "rust_decimal::serde::float")]
    pub change_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub change_percent: Decimal,
    pub trend: Trend,
}

/// Result of the net curve tool.
#[derive(Debug, Clone, Serialize)]
pub struct NetCurveResult {
    pub address: String,
    pub chain_id: String,
    pub count: usize,
    pub summary: Option<NetCurveSummary>,
    pub data_points: Vec<NetCurvePoint>,
}

// ============================================================================
// Gas Market
// ============================================================================

/// One gas price level (slow, normal, fast, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasTier {
    pub level: String,
    /// Price in wei.
    pub price: f64,
    pub front_tx_count: Option<f64>,
    pub estimated_seconds: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A gas tier with its gwei price.
#[derive(Debug, Clone, Serialize)]
pub struct GasTierView {
    #[serde(flatten)]
    pub tier: GasTier,
    pub price_gwei: f64,
}

/// Typical gas usage of a transaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GasEstimate {
    pub kind: &'static str,
    pub gas_units: u64,
    pub description: &'static str,
}

/// Result of the gas prices tool.
#[derive(Debug, Clone, Serialize)]
pub struct GasPricesResult {
    pub chain: String,
    pub gas_tiers: Vec<GasTierView>,
    pub estimates: Vec<GasEstimate>,
    pub note: &'static str,
}

// ============================================================================
// Account Units
// ============================================================================

/// API units balance and daily usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUnits {
    pub balance: i64,
    #[serde(default)]
    pub stats: Vec<UnitUsage>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitUsage {
    pub usage: i64,
    pub remains: i64,
    pub date: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeakDay {
    pub date: String,
    pub usage: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageAnalysis {
    pub total_usage: i64,
    pub days_reported: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_daily_usage: Decimal,
    /// `None` when there is no recent usage.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub days_remaining_at_current_rate: Option<Decimal>,
    pub peak_day: PeakDay,
    pub recommendation: String,
}

/// Result of the account units tool.
#[derive(Debug, Clone, Serialize)]
pub struct AccountUnitsResult {
    #[serde(flatten)]
    pub units: AccountUnits,
    pub usage_analysis: Option<UsageAnalysis>,
}
