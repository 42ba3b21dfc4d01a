//! User portfolio types: balances, NFTs, protocol positions, history and approvals.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Extra, PageInfo};

// ============================================================================
// Balances
// ============================================================================

/// Total balance across all chains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalBalance {
    pub total_usd_value: f64,
    pub chain_list: Vec<ChainBalance>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Balance on one chain, as listed in [`TotalBalance`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainBalance {
    /// Chain identifier.
    pub id: String,
    pub name: Option<String>,
    pub usd_value: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Balance on a single requested chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainUsdValue {
    pub usd_value: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of the user balance tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserBalanceResult {
    Total {
        address: String,
        /// Sum of the per-chain balances.
        #[serde(with = "rust_decimal::serde::float")]
        total_usd_value: Decimal,
        /// Total as reported upstream.
        reported_total_usd_value: f64,
        chain_count: usize,
        chain_list: Vec<ChainBalance>,
    },
    Chain {
        address: String,
        chain_id: String,
        usd_value: f64,
    },
}

// ============================================================================
// NFTs
// ============================================================================

/// NFT held by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nft {
    pub id: String,
    pub contract_id: String,
    pub chain: String,
    pub name: Option<String>,
    pub contract_name: Option<String>,
    pub usd_price: Option<f64>,
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of the user NFTs tool.
#[derive(Debug, Clone, Serialize)]
pub struct UserNftsResult {
    pub address: String,
    pub chain_id: String,
    pub pagination: PageInfo,
    pub collection_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_usd_value: Decimal,
    pub nfts: Vec<Nft>,
}

// ============================================================================
// Protocol Positions
// ============================================================================

/// Level of detail for protocol positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Per-protocol totals only.
    Simple,
    /// Full portfolio items.
    #[default]
    Complex,
}

impl std::str::FromStr for DetailLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(DetailLevel::Simple),
            "complex" => Ok(DetailLevel::Complex),
            _ => Err(format!("Invalid detail level: {s} (expected 'simple' or 'complex')")),
        }
    }
}

/// Protocol position totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleProtocolPosition {
    pub id: String,
    pub chain: String,
    pub name: Option<String>,
    pub net_usd_value: f64,
    pub asset_usd_value: f64,
    pub debt_usd_value: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Protocol position with portfolio items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexProtocolPosition {
    pub id: String,
    pub chain: String,
    pub name: Option<String>,
    pub portfolio_item_list: Vec<PortfolioItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A lending, staking or liquidity position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub name: String,
    pub stats: PortfolioStats,
    #[serde(default)]
    pub detail_types: Vec<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub asset_usd_value: f64,
    pub debt_usd_value: f64,
    pub net_usd_value: f64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Positions in either detail level.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProtocolPositions {
    Simple(Vec<SimpleProtocolPosition>),
    Complex(Vec<ComplexProtocolPosition>),
}

/// Aggregated position values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_net_usd_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_asset_usd_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debt_usd_value: Decimal,
}

/// Result of the user protocols tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserProtocolsResult {
    Single {
        address: String,
        protocol_id: String,
        chain_id: Option<String>,
        summary: PositionSummary,
        protocol: ComplexProtocolPosition,
    },
    List {
        address: String,
        chain_id: String,
        detail_level: DetailLevel,
        protocol_count: usize,
        summary: PositionSummary,
        protocols: ProtocolPositions,
    },
}

// ============================================================================
// History
// ============================================================================

/// One page of transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub history_list: Vec<HistoryEntry>,
    #[serde(default)]
    pub token_dict: BTreeMap<String, HistoryToken>,
    #[serde(default)]
    pub project_dict: Extra,
    #[serde(default)]
    pub cate_dict: Extra,
    #[serde(default)]
    pub cex_dict: Extra,
}

/// A historical transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Transaction hash.
    pub id: String,
    pub chain: String,
    pub time_at: f64,
    pub cate_id: Option<String>,
    #[serde(default)]
    pub sends: Vec<TransferItem>,
    #[serde(default)]
    pub receives: Vec<TransferItem>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Token movement inside a historical transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItem {
    pub amount: f64,
    pub token_id: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Token metadata from the history token dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryToken {
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Filters a history query ran with.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryFilters {
    pub token_id: Option<String>,
    pub start_time: Option<u64>,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub transaction_count: usize,
    /// Distinct chains, sorted.
    pub chains_involved: Vec<String>,
    /// Volume of sends and receives priced at current token prices.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value_usd: Decimal,
}

/// Result of the user history tool.
#[derive(Debug, Clone, Serialize)]
pub struct UserHistoryResult {
    pub address: String,
    pub chain_id: String,
    pub filters: HistoryFilters,
    pub summary: HistorySummary,
    #[serde(flatten)]
    pub page: HistoryPage,
}

// ============================================================================
// Approvals
// ============================================================================

/// Kind of approval to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    #[default]
    Token,
    Nft,
}

impl std::str::FromStr for ApprovalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(ApprovalType::Token),
            "nft" => Ok(ApprovalType::Nft),
            _ => Err(format!("Invalid approval type: {s} (expected 'token' or 'nft')")),
        }
    }
}

/// A token with its approved spenders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenApproval {
    /// Token id.
    pub id: String,
    pub chain: String,
    pub symbol: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub spenders: Vec<Spender>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A contract allowed to spend a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spender {
    /// Spender contract address.
    pub id: String,
    /// Approved amount.
    pub value: f64,
    pub exposure_usd: Option<f64>,
    pub protocol: Option<SpenderProtocol>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Spender {
    /// USD at risk through this approval.
    pub fn exposure(&self, token_price: f64) -> f64 {
        self.exposure_usd.unwrap_or(self.value * token_price)
    }

    /// Display name of the spender.
    pub fn display_name(&self) -> String {
        self.protocol
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpenderProtocol {
    pub id: String,
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// NFT approvals, per token and per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftApprovals {
    #[serde(default)]
    pub tokens: Vec<NftApproval>,
    #[serde(default)]
    pub contracts: Vec<NftApproval>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftApproval {
    pub spender: NftSpender,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftSpender {
    pub id: String,
    pub protocol: Option<SpenderProtocol>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An approval exposing more than the high-risk threshold.
#[derive(Debug, Clone, Serialize)]
pub struct RiskyApproval {
    pub token_id: String,
    pub symbol: Option<String>,
    pub spender_id: String,
    pub spender_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub exposure_usd: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenApprovalAnalysis {
    /// Number of (token, spender) approvals.
    pub total_approvals: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_exposure_usd: Decimal,
    pub high_risk_count: usize,
    pub unique_spenders: usize,
    pub spender_list: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NftApprovalAnalysis {
    pub total_nft_approvals: usize,
    pub total_contract_approvals: usize,
    pub unique_spenders: usize,
    pub spender_list: Vec<String>,
}

/// Result of the user approvals tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserApprovalsResult {
    Token {
        address: String,
        chain_id: String,
        approval_type: ApprovalType,
        security_analysis: TokenApprovalAnalysis,
        approvals: Vec<TokenApproval>,
        high_risk_approvals: Vec<RiskyApproval>,
    },
    Nft {
        address: String,
        chain_id: String,
        approval_type: ApprovalType,
        security_analysis: NftApprovalAnalysis,
        #[serde(flatten)]
        approvals: NftApprovals,
    },
}
