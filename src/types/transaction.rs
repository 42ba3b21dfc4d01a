//! Transaction simulation types.

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use super::Extra;

/// Transaction as supplied by the caller, before validation.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct TransactionInput {
    /// DeBank chain ID (e.g., "eth", "bsc"). Must support pre-execution.
    pub chain_id: String,
    /// Sender address (0x...).
    pub from: String,
    /// Recipient or contract address (0x...).
    pub to: String,
    /// Value in wei, hex ("0x...") or decimal. Defaults to "0x0".
    #[serde(default)]
    pub value: Option<String>,
    /// Hex-encoded calldata. Defaults to "0x".
    #[serde(default)]
    pub data: Option<String>,
    /// Optional gas limit.
    #[serde(default)]
    pub gas: Option<String>,
    /// Optional gas price in wei.
    #[serde(default)]
    pub gas_price: Option<String>,
    /// Optional sender nonce.
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Transaction object sent for pre-execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxObject {
    /// Numeric EVM chain id.
    pub chain_id: u64,
    pub from: String,
    pub to: String,
    /// Value in wei, as a hex or decimal string.
    pub value: String,
    /// Hex-encoded calldata.
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Request body for the pre-exec and explain endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PreExecRequest {
    pub tx: TxObject,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_tx_list: Vec<TxObject>,
}

/// Pre-execution response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreExecResult {
    pub pre_exec: PreExecStatus,
    #[serde(default)]
    pub balance_change: BalanceChange,
    pub gas: Option<GasUsage>,
    #[serde(default)]
    pub is_multisig: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreExecStatus {
    pub success: bool,
    pub error: Option<PreExecError>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreExecError {
    pub msg: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Assets moved by a simulated transaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceChange {
    #[serde(default)]
    pub send_token_list: Vec<TokenMovement>,
    #[serde(default)]
    pub receive_token_list: Vec<TokenMovement>,
    #[serde(default)]
    pub send_nft_list: Vec<Extra>,
    #[serde(default)]
    pub receive_nft_list: Vec<Extra>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMovement {
    pub amount_usd: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasUsage {
    #[serde(default)]
    pub gas_used: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Explain-only response; passed through as returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxExplanation {
    #[serde(flatten)]
    pub fields: Extra,
}

/// Overall risk of a simulated transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Warnings and recommendations derived from a simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyAnalysis {
    pub risk_level: RiskLevel,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub will_succeed: bool,
    pub estimated_gas: u64,
}

/// Result of the simulate transaction tool.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SimulationResult {
    Simulated {
        #[serde(flatten)]
        result: PreExecResult,
        safety_analysis: SafetyAnalysis,
    },
    Explained {
        #[serde(flatten)]
        explanation: TxExplanation,
    },
}
