//! Core tools: chains, protocols, tokens and wallet balances.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    debank::DeBankClient,
    error::{AppError, Result},
    types::{
        usd, ChainsResult, HolderEntry, ProtocolsResult, TokenHoldersResult, TokenInfoResult,
        UserBalanceResult,
    },
    validation::{
        validate_date, validate_optional_chain_id, validate_pagination,
        validate_protocol_id, validate_token_id, validate_token_ids, ChainAllowList, ChainId,
        EvmAddress, Pagination,
    },
};

/// Largest page the top holders endpoint serves.
pub const MAX_HOLDERS_LIMIT: u32 = 100;

/// Deepest offset the top holders endpoint serves.
pub const MAX_HOLDERS_OFFSET: u64 = 10_000;

/// Which protocols to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolQuery {
    /// One protocol by id.
    Single(String),
    /// Protocols deployed on one chain.
    Chain(ChainId),
    /// Protocols on every chain.
    All,
}

impl ProtocolQuery {
    /// Resolve the protocol tool arguments.
    ///
    /// `protocol_id` and `all_chains` are mutually exclusive. With neither a
    /// protocol nor a chain, every chain is listed.
    pub fn resolve(
        protocol_id: Option<&str>,
        chain_id: Option<&str>,
        all_chains: bool,
        allowed: &ChainAllowList,
    ) -> Result<Self> {
        let chain = validate_optional_chain_id(chain_id, allowed)?;
        match (protocol_id, all_chains) {
            (Some(_), true) => Err(AppError::validation(
                "protocol_id",
                "cannot be combined with all_chains",
            )),
            (Some(id), false) => Ok(Self::Single(validate_protocol_id(id)?)),
            (None, true) => Ok(Self::All),
            (None, false) => Ok(chain.map_or(Self::All, Self::Chain)),
        }
    }
}

/// Which token data to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenInfoQuery {
    Single { token_id: String },
    Batch { token_ids: Vec<String> },
    Historical { token_id: String, date: String },
}

impl TokenInfoQuery {
    /// Resolve the token info tool arguments.
    ///
    /// Exactly one of `token_id` and `token_ids` must be given; `date` only
    /// applies to a single token.
    pub fn resolve(
        token_id: Option<&str>,
        token_ids: Option<&[String]>,
        date: Option<&str>,
    ) -> Result<Self> {
        let date = date.map(str::trim).filter(|d| !d.is_empty());
        match (token_id, token_ids) {
            (Some(_), Some(_)) => {
                Err(AppError::validation("token_id", "cannot be combined with token_ids"))
            }
            (None, None) => {
                Err(AppError::validation("token_id", "either token_id or token_ids is required"))
            }
            (None, Some(_)) if date.is_some() => {
                Err(AppError::validation("date", "historical prices require a single token_id"))
            }
            (None, Some(ids)) => Ok(Self::Batch { token_ids: validate_token_ids(ids)? }),
            (Some(id), None) => {
                let token_id = validate_token_id("token_id", id)?;
                match date {
                    Some(date) => Ok(Self::Historical { token_id, date: validate_date(date)? }),
                    None => Ok(Self::Single { token_id }),
                }
            }
        }
    }
}

/// Validate a top holders page: limit within `[1, 100]`, offset at most 10 000.
pub fn holders_page(limit: Option<i64>, offset: Option<i64>) -> Result<Pagination> {
    let page = validate_pagination(limit, offset)?.with_max_limit(MAX_HOLDERS_LIMIT);
    if page.offset > MAX_HOLDERS_OFFSET {
        return Err(AppError::validation(
            "offset",
            format!("must be at most {MAX_HOLDERS_OFFSET}, got {}", page.offset),
        ));
    }
    Ok(page)
}

/// Handlers for the core tools.
#[derive(Clone)]
pub struct CoreService {
    client: Arc<DeBankClient>,
}

impl CoreService {
    /// Create a new core service.
    pub fn new(client: Arc<DeBankClient>) -> Self {
        Self { client }
    }

    /// One chain, or every supported chain.
    pub async fn get_chains(&self, chain: Option<ChainId>) -> Result<ChainsResult> {
        match chain {
            Some(chain) => {
                let chain = self.client.get_chain(&chain).await?;
                Ok(ChainsResult::Single { chain })
            }
            None => {
                let chains = self.client.get_chain_list().await?;
                Ok(ChainsResult::List { count: chains.len(), chains })
            }
        }
    }

    pub async fn get_protocols(&self, query: ProtocolQuery) -> Result<ProtocolsResult> {
        let protocols = match query {
            ProtocolQuery::Single(id) => {
                let protocol = self.client.get_protocol(&id).await?;
                return Ok(ProtocolsResult::Single { protocol });
            }
            ProtocolQuery::Chain(chain) => self.client.get_protocol_list(&chain).await?,
            ProtocolQuery::All => self.client.get_all_protocols().await?,
        };
        Ok(ProtocolsResult::List { count: protocols.len(), protocols })
    }

    pub async fn get_token_info(
        &self,
        chain: ChainId,
        query: TokenInfoQuery,
    ) -> Result<TokenInfoResult> {
        match query {
            TokenInfoQuery::Single { token_id } => {
                let token = self.client.get_token(&chain, &token_id).await?;
                Ok(TokenInfoResult::Single { token })
            }
            TokenInfoQuery::Batch { token_ids } => {
                let tokens = self.client.get_tokens_by_ids(&chain, &token_ids).await?;
                Ok(TokenInfoResult::Batch { count: tokens.len(), tokens })
            }
            TokenInfoQuery::Historical { token_id, date } => {
                let price = self.client.get_token_history_price(&chain, &token_id, &date).await?;
                Ok(TokenInfoResult::Historical {
                    chain_id: chain.to_string(),
                    token_id,
                    date,
                    historical: true,
                    price,
                })
            }
        }
    }

    /// Ranked top holders of a token.
    pub async fn get_token_holders(
        &self,
        chain: ChainId,
        token_id: String,
        page: Pagination,
    ) -> Result<TokenHoldersResult> {
        let holders =
            self.client.get_token_top_holders(&chain, &token_id, page.offset, page.limit).await?;

        let holders: Vec<HolderEntry> = holders
            .into_iter()
            .enumerate()
            .map(|(i, holder)| HolderEntry {
                rank: page.offset + i as u64 + 1,
                address: holder.0,
                amount: holder.1,
            })
            .collect();

        Ok(TokenHoldersResult {
            chain_id: chain.to_string(),
            token_id,
            limit: page.limit,
            offset: page.offset,
            count: holders.len(),
            holders,
        })
    }

    /// Balance on one chain, or the total across chains.
    ///
    /// The total is recomputed from the per-chain figures.
    pub async fn get_user_balance(
        &self,
        user: EvmAddress,
        chain: Option<ChainId>,
    ) -> Result<UserBalanceResult> {
        if let Some(chain) = chain {
            let balance = self.client.get_user_chain_balance(&user, &chain).await?;
            return Ok(UserBalanceResult::Chain {
                address: user.to_string(),
                chain_id: chain.to_string(),
                usd_value: balance.usd_value,
            });
        }

        let balance = self.client.get_user_total_balance(&user).await?;
        let total: Decimal = balance.chain_list.iter().map(|c| usd(c.usd_value)).sum();
        tracing::debug!(
            address = %user,
            total = %total,
            reported = balance.total_usd_value,
            "Computed total balance"
        );

        Ok(UserBalanceResult::Total {
            address: user.to_string(),
            total_usd_value: total,
            reported_total_usd_value: balance.total_usd_value,
            chain_count: balance.chain_list.len(),
            chain_list: balance.chain_list,
        })
    }
}
