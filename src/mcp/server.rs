//! MCP server implementation.

use std::sync::Arc;

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;

use crate::{
    config::Config,
    debank::DeBankClient,
    error::AppError,
    services::{
        advanced::validate_transaction, core::holders_page, portfolio::history_filters,
        AdvancedService, CoreService, NetCurveQuery, PortfolioService, ProtocolQuery,
        TokenInfoQuery, UserProtocolsQuery, UserTokensQuery,
    },
    types::{ApprovalType, PreExecRequest, TransactionInput},
    validation::{
        validate_address, validate_chain_id, validate_optional_chain_id, validate_pagination,
        validate_pool_id, validate_token_id, ChainAllowList,
    },
};

/// DeBank MCP Server.
///
/// Exposes the DeBank Pro API as MCP tools in three tiers: core data,
/// wallet portfolio and advanced analytics.
#[derive(Clone)]
pub struct DeBankServer {
    core: CoreService,
    portfolio: PortfolioService,
    advanced: AdvancedService,
    chains: Arc<ChainAllowList>,
    tool_router: ToolRouter<Self>,
}

impl DeBankServer {
    /// Create a new DeBank MCP Server.
    ///
    /// No request is made until the first tool call.
    pub fn new(config: Config) -> Result<Self, AppError> {
        tracing::info!(base_url = %config.base_url, "Initializing DeBank MCP Server");

        let client = Arc::new(DeBankClient::new(&config)?);

        Ok(Self {
            core: CoreService::new(client.clone()),
            portfolio: PortfolioService::new(client.clone()),
            advanced: AdvancedService::new(client),
            chains: Arc::new(config.supported_chains),
            tool_router: Self::tool_router(),
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

// ============================================================================
// Tool Inputs
// ============================================================================

/// Input parameters for the debank_get_chains tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetChainsInput {
    /// Optional chain ID (e.g., "eth", "bsc"). Omit to list all supported chains.
    #[serde(default)]
    pub chain_id: Option<String>,
}

/// Input parameters for the debank_get_protocols tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetProtocolsInput {
    /// Optional protocol ID (e.g., "uniswap3", "aave3").
    #[serde(default)]
    pub protocol_id: Option<String>,
    /// Optional chain ID to list protocols on one chain.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// List protocols on every chain. Cannot be combined with protocol_id.
    #[serde(default)]
    pub all_chains: Option<bool>,
}

/// Input parameters for the debank_get_token_info tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetTokenInfoInput {
    /// Chain ID (e.g., "eth").
    pub chain_id: String,
    /// Token contract address or native token ID (e.g., "eth").
    #[serde(default)]
    pub token_id: Option<String>,
    /// Up to 100 token IDs for a batch lookup. Cannot be combined with token_id.
    #[serde(default)]
    pub token_ids: Option<Vec<String>>,
    /// Optional date (YYYY-MM-DD) for a historical price. Requires token_id.
    #[serde(default)]
    pub date: Option<String>,
}

/// Input parameters for the debank_get_token_holders tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetTokenHoldersInput {
    /// Chain ID (e.g., "eth").
    pub chain_id: String,
    /// Token contract address or native token ID.
    pub token_id: String,
    /// Holders per page, 1 to 100. Default: 20.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Holders to skip, at most 10000. Default: 0.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input parameters for the debank_get_user_balance tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserBalanceInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional chain ID. Omit for the total across all chains.
    #[serde(default)]
    pub chain_id: Option<String>,
}

/// Input parameters for the debank_get_user_tokens tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserTokensInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional chain ID. Omit for holdings on all chains.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Optional token to query. Requires chain_id.
    #[serde(default)]
    pub token_id: Option<String>,
    /// Include unverified and low-value tokens. Default: false.
    #[serde(default)]
    pub is_all: Option<bool>,
    /// Page size, clamped to 1..=500. Default: 20.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Items to skip. Default: 0.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input parameters for the debank_get_user_nfts tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserNftsInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional chain ID. Omit for NFTs on all chains.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Include NFTs without a valuation. Default: false.
    #[serde(default)]
    pub is_all: Option<bool>,
    /// Page size, clamped to 1..=500. Default: 20.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Items to skip. Default: 0.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Input parameters for the debank_get_user_protocols tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserProtocolsInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional protocol ID for a single position.
    #[serde(default)]
    pub protocol_id: Option<String>,
    /// Optional chain ID. Omit for positions on all chains.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// "simple" for totals only, "complex" for full portfolio items. Default: "complex".
    #[serde(default)]
    pub detail_level: Option<String>,
}

/// Input parameters for the debank_get_user_history tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserHistoryInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional chain ID. Omit for history on all chains.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Optional token filter.
    #[serde(default)]
    pub token_id: Option<String>,
    /// Optional Unix timestamp to page back from.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Transactions to return, at most 20. Default: 20.
    #[serde(default)]
    pub page_count: Option<i64>,
}

/// Input parameters for the debank_get_user_approvals tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserApprovalsInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Chain ID (required).
    pub chain_id: String,
    /// "token" or "nft". Default: "token".
    #[serde(default)]
    pub approval_type: Option<String>,
}

/// Input parameters for the debank_get_user_net_curve tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetUserNetCurveInput {
    /// Wallet address (0x...).
    pub address: String,
    /// Optional single chain ID.
    #[serde(default)]
    pub chain_id: Option<String>,
    /// Optional comma-separated chain IDs. Cannot be combined with chain_id.
    #[serde(default)]
    pub chain_ids: Option<String>,
}

/// Input parameters for the debank_get_pool_info tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetPoolInfoInput {
    /// Pool ID (0x...).
    pub pool_id: String,
    /// Chain ID.
    pub chain_id: String,
}

/// Input parameters for the debank_simulate_transaction tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct SimulateTransactionInput {
    /// Transaction to simulate.
    pub transaction: TransactionInput,
    /// Transactions to execute before it, in order.
    #[serde(default)]
    pub pending_transactions: Option<Vec<TransactionInput>>,
    /// Only explain the transaction, without simulating balance changes. Default: false.
    #[serde(default)]
    pub explain_only: Option<bool>,
}

/// Input parameters for the debank_get_gas_prices tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct GetGasPricesInput {
    /// Chain ID.
    pub chain_id: String,
}

// ============================================================================
// Tools
// ============================================================================

#[tool_router]
impl DeBankServer {
    #[tool(description = "List blockchains supported by DeBank, or get details of one chain")]
    pub async fn debank_get_chains(
        &self,
        Parameters(input): Parameters<GetChainsInput>,
    ) -> Result<String, McpError> {
        tracing::info!(chain = ?input.chain_id, "debank_get_chains called");

        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        to_json(&self.core.get_chains(chain).await?)
    }

    #[tool(
        description = "Get DeFi protocol information: one protocol, protocols on a chain, or protocols on all chains"
    )]
    pub async fn debank_get_protocols(
        &self,
        Parameters(input): Parameters<GetProtocolsInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            protocol = ?input.protocol_id,
            chain = ?input.chain_id,
            all_chains = ?input.all_chains,
            "debank_get_protocols called"
        );

        let query = ProtocolQuery::resolve(
            input.protocol_id.as_deref(),
            input.chain_id.as_deref(),
            input.all_chains.unwrap_or(false),
            &self.chains,
        )?;
        to_json(&self.core.get_protocols(query).await?)
    }

    #[tool(
        description = "Get token details and current price, a batch of up to 100 tokens, or a historical price for a date"
    )]
    pub async fn debank_get_token_info(
        &self,
        Parameters(input): Parameters<GetTokenInfoInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            chain = %input.chain_id,
            token = ?input.token_id,
            batch = input.token_ids.as_ref().map(Vec::len),
            date = ?input.date,
            "debank_get_token_info called"
        );

        let chain = validate_chain_id(&input.chain_id, &self.chains)?;
        let query = TokenInfoQuery::resolve(
            input.token_id.as_deref(),
            input.token_ids.as_deref(),
            input.date.as_deref(),
        )?;
        to_json(&self.core.get_token_info(chain, query).await?)
    }

    #[tool(description = "Get the top holders of a token, ranked by amount held")]
    pub async fn debank_get_token_holders(
        &self,
        Parameters(input): Parameters<GetTokenHoldersInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            chain = %input.chain_id,
            token = %input.token_id,
            limit = ?input.limit,
            offset = ?input.offset,
            "debank_get_token_holders called"
        );

        let chain = validate_chain_id(&input.chain_id, &self.chains)?;
        let token_id = validate_token_id("token_id", &input.token_id)?;
        let page = holders_page(input.limit, input.offset)?;
        to_json(&self.core.get_token_holders(chain, token_id, page).await?)
    }

    #[tool(
        description = "Get a wallet's USD balance on one chain, or its total across all chains with a per-chain breakdown"
    )]
    pub async fn debank_get_user_balance(
        &self,
        Parameters(input): Parameters<GetUserBalanceInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = ?input.chain_id,
            "debank_get_user_balance called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        to_json(&self.core.get_user_balance(address, chain).await?)
    }

    #[tool(
        description = "Get a wallet's token holdings with amounts, prices and USD values (paginated)"
    )]
    pub async fn debank_get_user_tokens(
        &self,
        Parameters(input): Parameters<GetUserTokensInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = ?input.chain_id,
            token = ?input.token_id,
            limit = ?input.limit,
            offset = ?input.offset,
            "debank_get_user_tokens called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        let page = validate_pagination(input.limit, input.offset)?;
        let query = UserTokensQuery::resolve(
            chain,
            input.token_id.as_deref(),
            input.is_all.unwrap_or(false),
            page,
        )?;
        to_json(&self.portfolio.get_user_tokens(address, query).await?)
    }

    #[tool(description = "Get a wallet's NFTs with collection and valuation data (paginated)")]
    pub async fn debank_get_user_nfts(
        &self,
        Parameters(input): Parameters<GetUserNftsInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = ?input.chain_id,
            limit = ?input.limit,
            offset = ?input.offset,
            "debank_get_user_nfts called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        let page = validate_pagination(input.limit, input.offset)?;
        let result = self
            .portfolio
            .get_user_nfts(address, chain, input.is_all.unwrap_or(false), page)
            .await?;
        to_json(&result)
    }

    #[tool(
        description = "Get a wallet's DeFi positions (lending, staking, liquidity) with net, asset and debt totals"
    )]
    pub async fn debank_get_user_protocols(
        &self,
        Parameters(input): Parameters<GetUserProtocolsInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            protocol = ?input.protocol_id,
            chain = ?input.chain_id,
            detail_level = ?input.detail_level,
            "debank_get_user_protocols called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        let query = UserProtocolsQuery::resolve(
            input.protocol_id.as_deref(),
            chain,
            input.detail_level.as_deref(),
        )?;
        to_json(&self.portfolio.get_user_protocols(address, query).await?)
    }

    #[tool(description = "Get a wallet's recent transactions with a volume summary")]
    pub async fn debank_get_user_history(
        &self,
        Parameters(input): Parameters<GetUserHistoryInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = ?input.chain_id,
            token = ?input.token_id,
            start_time = ?input.start_time,
            page_count = ?input.page_count,
            "debank_get_user_history called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_optional_chain_id(input.chain_id.as_deref(), &self.chains)?;
        let filters =
            history_filters(input.token_id.as_deref(), input.start_time, input.page_count)?;
        to_json(&self.portfolio.get_user_history(address, chain, filters).await?)
    }

    #[tool(
        description = "Get a wallet's token or NFT approvals with a security analysis of spender exposure"
    )]
    pub async fn debank_get_user_approvals(
        &self,
        Parameters(input): Parameters<GetUserApprovalsInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = %input.chain_id,
            approval_type = ?input.approval_type,
            "debank_get_user_approvals called"
        );

        let address = validate_address(&input.address)?;
        let chain = validate_chain_id(&input.chain_id, &self.chains)?;
        let approval_type = input
            .approval_type
            .as_deref()
            .map(|t| {
                t.parse::<ApprovalType>().map_err(|e| AppError::validation("approval_type", e))
            })
            .transpose()?
            .unwrap_or_default();
        to_json(&self.portfolio.get_user_approvals(address, chain, approval_type).await?)
    }

    #[tool(description = "Get a wallet's 24-hour net worth curve with a trend summary")]
    pub async fn debank_get_user_net_curve(
        &self,
        Parameters(input): Parameters<GetUserNetCurveInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            address = %input.address,
            chain = ?input.chain_id,
            chains = ?input.chain_ids,
            "debank_get_user_net_curve called"
        );

        let address = validate_address(&input.address)?;
        let query = NetCurveQuery::resolve(
            input.chain_id.as_deref(),
            input.chain_ids.as_deref(),
            &self.chains,
        )?;
        to_json(&self.advanced.get_user_net_curve(address, query).await?)
    }

    #[tool(description = "Get liquidity pool details with TVL, user counts and average deposit")]
    pub async fn debank_get_pool_info(
        &self,
        Parameters(input): Parameters<GetPoolInfoInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            pool = %input.pool_id,
            chain = %input.chain_id,
            "debank_get_pool_info called"
        );

        let pool_id = validate_pool_id(&input.pool_id)?;
        let chain = validate_chain_id(&input.chain_id, &self.chains)?;
        to_json(&self.advanced.get_pool_info(pool_id, chain).await?)
    }

    /// Simulate a transaction before signing it.
    ///
    /// Full simulations include a safety analysis; nothing is broadcast.
    #[tool(
        description = "Pre-execute a transaction to preview balance changes, gas and failure risk, with a safety analysis. Nothing is broadcast."
    )]
    pub async fn debank_simulate_transaction(
        &self,
        Parameters(input): Parameters<SimulateTransactionInput>,
    ) -> Result<String, McpError> {
        tracing::info!(
            chain = %input.transaction.chain_id,
            from = %input.transaction.from,
            to = %input.transaction.to,
            pending = input.pending_transactions.as_ref().map_or(0, Vec::len),
            explain_only = ?input.explain_only,
            "debank_simulate_transaction called"
        );

        let tx = validate_transaction("transaction", &input.transaction)?;
        let pending_tx_list = input
            .pending_transactions
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, tx)| validate_transaction(&format!("pending_transactions[{i}]"), tx))
            .collect::<Result<Vec<_>, _>>()?;

        let request = PreExecRequest { tx, pending_tx_list };
        let result = self
            .advanced
            .simulate_transaction(request, input.explain_only.unwrap_or(false))
            .await?;
        to_json(&result)
    }

    #[tool(
        description = "Get current gas price tiers for a chain, in wei and gwei, with cost estimates"
    )]
    pub async fn debank_get_gas_prices(
        &self,
        Parameters(input): Parameters<GetGasPricesInput>,
    ) -> Result<String, McpError> {
        tracing::info!(chain = %input.chain_id, "debank_get_gas_prices called");

        let chain = validate_chain_id(&input.chain_id, &self.chains)?;
        to_json(&self.advanced.get_gas_prices(chain).await?)
    }

    #[tool(description = "Check the remaining DeBank API units and recent daily usage")]
    pub async fn debank_get_account_units(&self) -> Result<String, McpError> {
        tracing::info!("debank_get_account_units called");

        to_json(&self.advanced.get_account_units().await?)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for DeBankServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "debank-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "DeBank MCP Server. Provides tools for querying chains, protocols, tokens, \
                 wallet portfolios, transaction history and approvals, and for simulating \
                 transactions through the DeBank Pro API."
                    .to_string(),
            ),
        }
    }
}
