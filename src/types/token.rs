//! Token-related types.

use serde::{Deserialize, Serialize};

use super::{Extra, PageInfo};

/// Token information, optionally with a held amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Contract address, or the native token id (e.g., "eth").
    pub id: String,
    pub chain: String,
    pub name: Option<String>,
    pub symbol: String,
    pub decimals: u32,
    /// Current USD price.
    pub price: f64,
    pub logo_url: Option<String>,
    pub is_verified: Option<bool>,
    pub is_core: Option<bool>,
    pub is_wallet: Option<bool>,
    pub time_at: Option<f64>,
    /// Amount held (user endpoints only).
    pub amount: Option<f64>,
    pub raw_amount: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Token {
    /// USD value of the held amount.
    pub fn usd_value(&self) -> f64 {
        self.amount.unwrap_or(0.0) * self.price
    }
}

/// Historical token price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenHistoricalPrice {
    pub price: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A `[address, amount]` pair from the top holders endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenHolder(pub String, pub f64);

/// A ranked token holder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HolderEntry {
    /// 1-based rank across all pages.
    pub rank: u64,
    pub address: String,
    pub amount: f64,
}

/// Result of the token info tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TokenInfoResult {
    Single {
        token: Token,
    },
    Batch {
        tokens: Vec<Token>,
        count: usize,
    },
    Historical {
        chain_id: String,
        token_id: String,
        date: String,
        historical: bool,
        #[serde(flatten)]
        price: TokenHistoricalPrice,
    },
}

/// Result of the token holders tool.
#[derive(Debug, Clone, Serialize)]
pub struct TokenHoldersResult {
    pub chain_id: String,
    pub token_id: String,
    pub limit: u32,
    pub offset: u64,
    pub count: usize,
    pub holders: Vec<HolderEntry>,
}

/// Result of the user tokens tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserTokensResult {
    Single {
        address: String,
        chain_id: String,
        token_id: String,
        token: Token,
    },
    List {
        address: String,
        chain_id: String,
        pagination: PageInfo,
        #[serde(with = "rust_decimal::serde::float")]
        total_usd_value: rust_decimal::Decimal,
        tokens: Vec<Token>,
    },
}
