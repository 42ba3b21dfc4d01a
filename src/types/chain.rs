//! Chain-related types.

use serde::{Deserialize, Serialize};

use super::Extra;

/// Blockchain network supported by DeBank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    /// DeBank chain identifier (e.g., "eth", "bsc").
    pub id: String,
    /// EVM chain ID.
    pub community_id: u64,
    /// Human-readable name.
    pub name: String,
    /// Native token identifier.
    pub native_token_id: String,
    pub logo_url: Option<String>,
    /// Wrapped native token address.
    pub wrapped_token_id: Option<String>,
    /// Whether transaction pre-execution is available.
    pub is_support_pre_exec: Option<bool>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Result of the chains tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChainsResult {
    Single { chain: Chain },
    List { chains: Vec<Chain>, count: usize },
}
