//! Protocol and pool types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Extra;

/// DeFi protocol information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
    pub id: String,
    /// Chain the protocol is deployed on.
    pub chain: String,
    pub name: String,
    pub site_url: Option<String>,
    pub logo_url: Option<String>,
    pub has_supported_portfolio: Option<bool>,
    /// Total value locked in USD.
    pub tvl: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of the protocols tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProtocolsResult {
    Single { protocol: Protocol },
    List { protocols: Vec<Protocol>, count: usize },
}

/// Liquidity pool information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub chain: String,
    pub protocol_id: String,
    pub name: Option<String>,
    pub stats: Option<PoolStats>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Deposit statistics of a pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub deposit_usd_value: f64,
    #[serde(default)]
    pub deposit_user_count: u64,
    #[serde(default)]
    pub deposit_valuable_user_count: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Derived pool metrics.
#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value_locked_usd: Decimal,
    pub total_users: u64,
    pub valuable_users: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_deposit_usd: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub valuable_user_ratio_pct: Decimal,
    pub protocol: String,
    pub pool_name: Option<String>,
}

/// Result of the pool info tool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolInfoResult {
    #[serde(flatten)]
    pub pool: Pool,
    pub summary: Option<PoolSummary>,
}
