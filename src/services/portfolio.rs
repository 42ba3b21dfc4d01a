//! Portfolio tools: holdings, protocol positions, history and approvals.

use std::{collections::BTreeSet, sync::Arc};

use rust_decimal::Decimal;

use crate::{
    debank::DeBankClient,
    error::{AppError, Result},
    types::{
        paginate, sum_usd, usd, ApprovalType, ComplexProtocolPosition, DetailLevel, HistoryFilters,
        HistoryPage, HistorySummary, NftApprovalAnalysis, NftApprovals, PortfolioStats,
        PositionSummary, ProtocolPositions, RiskyApproval, SimpleProtocolPosition, TokenApproval,
        TokenApprovalAnalysis, UserApprovalsResult, UserHistoryResult, UserNftsResult,
        UserProtocolsResult, UserTokensResult,
    },
    validation::{
        validate_pagination, validate_protocol_id, validate_start_time, validate_token_id,
        ChainId, EvmAddress, Pagination,
    },
};

/// Most history entries the upstream returns per call.
pub const MAX_HISTORY_PAGE_COUNT: u32 = 20;

/// Exposure above which an approval is flagged, in USD.
pub const HIGH_RISK_EXPOSURE_USD: f64 = 10_000.0;

const ALL_CHAINS: &str = "all_chains";

/// Which token holdings to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserTokensQuery {
    /// One token on one chain.
    Single { chain: ChainId, token_id: String },
    /// Holdings on one chain, or on all chains when `chain` is `None`.
    List { chain: Option<ChainId>, is_all: bool, page: Pagination },
}

impl UserTokensQuery {
    /// Resolve the user tokens tool arguments. A `token_id` requires a chain.
    pub fn resolve(
        chain: Option<ChainId>,
        token_id: Option<&str>,
        is_all: bool,
        page: Pagination,
    ) -> Result<Self> {
        match (token_id, chain) {
            (Some(_), None) => {
                Err(AppError::validation("chain_id", "is required when token_id is given"))
            }
            (Some(id), Some(chain)) => {
                Ok(Self::Single { chain, token_id: validate_token_id("token_id", id)? })
            }
            (None, chain) => Ok(Self::List { chain, is_all, page }),
        }
    }
}

/// Which protocol positions to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserProtocolsQuery {
    Single { protocol_id: String, chain: Option<ChainId> },
    List { chain: Option<ChainId>, detail_level: DetailLevel },
}

impl UserProtocolsQuery {
    pub fn resolve(
        protocol_id: Option<&str>,
        chain: Option<ChainId>,
        detail_level: Option<&str>,
    ) -> Result<Self> {
        let detail_level = detail_level
            .map(|d| d.parse::<DetailLevel>().map_err(|e| AppError::validation("detail_level", e)))
            .transpose()?
            .unwrap_or_default();

        match protocol_id {
            Some(id) => Ok(Self::Single { protocol_id: validate_protocol_id(id)?, chain }),
            None => Ok(Self::List { chain, detail_level }),
        }
    }
}

/// Validate history filters. `page_count` follows the pagination rules, then
/// the upstream ceiling.
pub fn history_filters(
    token_id: Option<&str>,
    start_time: Option<i64>,
    page_count: Option<i64>,
) -> Result<HistoryFilters> {
    let page_count = validate_pagination(page_count, None)?.limit.min(MAX_HISTORY_PAGE_COUNT);
    Ok(HistoryFilters {
        token_id: token_id.map(|id| validate_token_id("token_id", id)).transpose()?,
        start_time: validate_start_time(start_time)?,
        page_count,
    })
}

/// Handlers for the portfolio tools.
#[derive(Clone)]
pub struct PortfolioService {
    client: Arc<DeBankClient>,
}

impl PortfolioService {
    /// Create a new portfolio service.
    pub fn new(client: Arc<DeBankClient>) -> Self {
        Self { client }
    }

    /// Token holdings, paginated locally with the page's USD value.
    pub async fn get_user_tokens(
        &self,
        user: EvmAddress,
        query: UserTokensQuery,
    ) -> Result<UserTokensResult> {
        let (chain, is_all, page) = match query {
            UserTokensQuery::Single { chain, token_id } => {
                let token = self.client.get_user_token(&user, &chain, &token_id).await?;
                return Ok(UserTokensResult::Single {
                    address: user.to_string(),
                    chain_id: chain.to_string(),
                    token_id,
                    token,
                });
            }
            UserTokensQuery::List { chain, is_all, page } => (chain, is_all, page),
        };

        let tokens = match &chain {
            Some(chain) => self.client.get_user_token_list(&user, chain, is_all).await?,
            None => self.client.get_user_all_token_list(&user, is_all).await?,
        };

        let (tokens, pagination) = paginate(tokens, page);
        Ok(UserTokensResult::List {
            address: user.to_string(),
            chain_id: chain_label(chain.as_ref()),
            pagination,
            total_usd_value: sum_usd(tokens.iter().map(|t| t.usd_value())),
            tokens,
        })
    }

    /// NFT holdings, paginated locally.
    pub async fn get_user_nfts(
        &self,
        user: EvmAddress,
        chain: Option<ChainId>,
        is_all: bool,
        page: Pagination,
    ) -> Result<UserNftsResult> {
        let nfts = match &chain {
            Some(chain) => self.client.get_user_nft_list(&user, chain, is_all).await?,
            None => self.client.get_user_all_nft_list(&user, is_all).await?,
        };

        let (nfts, pagination) = paginate(nfts, page);
        let collections: BTreeSet<&str> = nfts.iter().map(|n| n.contract_id.as_str()).collect();

        Ok(UserNftsResult {
            address: user.to_string(),
            chain_id: chain_label(chain.as_ref()),
            pagination,
            collection_count: collections.len(),
            total_usd_value: sum_usd(nfts.iter().map(|n| n.usd_price.unwrap_or(0.0))),
            nfts,
        })
    }

    /// Protocol positions with net, asset and debt totals.
    pub async fn get_user_protocols(
        &self,
        user: EvmAddress,
        query: UserProtocolsQuery,
    ) -> Result<UserProtocolsResult> {
        let (chain, detail_level) = match query {
            UserProtocolsQuery::Single { protocol_id, chain } => {
                let protocol =
                    self.client.get_user_protocol(&user, &protocol_id, chain.as_ref()).await?;
                return Ok(UserProtocolsResult::Single {
                    address: user.to_string(),
                    protocol_id,
                    chain_id: chain.map(|c| c.to_string()),
                    summary: complex_summary(std::slice::from_ref(&protocol)),
                    protocol,
                });
            }
            UserProtocolsQuery::List { chain, detail_level } => (chain, detail_level),
        };

        let (count, summary, protocols) = match detail_level {
            DetailLevel::Simple => {
                let list = match &chain {
                    Some(chain) => self.client.get_user_simple_protocol_list(&user, chain).await?,
                    None => self.client.get_user_all_simple_protocol_list(&user).await?,
                };
                (list.len(), simple_summary(&list), ProtocolPositions::Simple(list))
            }
            DetailLevel::Complex => {
                let list = match &chain {
                    Some(chain) => self.client.get_user_complex_protocol_list(&user, chain).await?,
                    None => self.client.get_user_all_complex_protocol_list(&user).await?,
                };
                (list.len(), complex_summary(&list), ProtocolPositions::Complex(list))
            }
        };

        Ok(UserProtocolsResult::List {
            address: user.to_string(),
            chain_id: chain_label(chain.as_ref()),
            detail_level,
            protocol_count: count,
            summary,
            protocols,
        })
    }

    /// Recent transactions with a volume summary.
    pub async fn get_user_history(
        &self,
        user: EvmAddress,
        chain: Option<ChainId>,
        filters: HistoryFilters,
    ) -> Result<UserHistoryResult> {
        let page = match &chain {
            Some(chain) => self.client.get_user_history_list(&user, chain, &filters).await?,
            None => self.client.get_user_all_history_list(&user, &filters).await?,
        };

        Ok(UserHistoryResult {
            address: user.to_string(),
            chain_id: chain_label(chain.as_ref()),
            filters,
            summary: history_summary(&page),
            page,
        })
    }

    /// Token or NFT approvals with a security analysis.
    pub async fn get_user_approvals(
        &self,
        user: EvmAddress,
        chain: ChainId,
        approval_type: ApprovalType,
    ) -> Result<UserApprovalsResult> {
        match approval_type {
            ApprovalType::Token => {
                let approvals = self.client.get_user_token_approvals(&user, &chain).await?;
                let (security_analysis, high_risk_approvals) = analyze_token_approvals(&approvals);
                Ok(UserApprovalsResult::Token {
                    address: user.to_string(),
                    chain_id: chain.to_string(),
                    approval_type,
                    security_analysis,
                    approvals,
                    high_risk_approvals,
                })
            }
            ApprovalType::Nft => {
                let approvals = self.client.get_user_nft_approvals(&user, &chain).await?;
                Ok(UserApprovalsResult::Nft {
                    address: user.to_string(),
                    chain_id: chain.to_string(),
                    approval_type,
                    security_analysis: analyze_nft_approvals(&approvals),
                    approvals,
                })
            }
        }
    }
}

fn chain_label(chain: Option<&ChainId>) -> String {
    chain.map_or_else(|| ALL_CHAINS.to_string(), ChainId::to_string)
}

fn summarize<I>(stats: I) -> PositionSummary
where
    I: IntoIterator<Item = (f64, f64, f64)>,
{
    let (mut net, mut asset, mut debt) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
    for (n, a, d) in stats {
        net += usd(n);
        asset += usd(a);
        debt += usd(d);
    }
    PositionSummary {
        total_net_usd_value: net.round_dp(2),
        total_asset_usd_value: asset.round_dp(2),
        total_debt_usd_value: debt.round_dp(2),
    }
}

fn simple_summary(positions: &[SimpleProtocolPosition]) -> PositionSummary {
    summarize(positions.iter().map(|p| (p.net_usd_value, p.asset_usd_value, p.debt_usd_value)))
}

fn complex_summary(positions: &[ComplexProtocolPosition]) -> PositionSummary {
    summarize(
        positions
            .iter()
            .flat_map(|p| p.portfolio_item_list.iter())
            .map(|item| stats_tuple(&item.stats)),
    )
}

fn stats_tuple(stats: &PortfolioStats) -> (f64, f64, f64) {
    (stats.net_usd_value, stats.asset_usd_value, stats.debt_usd_value)
}

/// Count, chains and USD volume of a history page. Transfers are priced
/// through the page's token dictionary; unknown tokens count as zero.
fn history_summary(page: &HistoryPage) -> HistorySummary {
    let chains: BTreeSet<&str> = page.history_list.iter().map(|tx| tx.chain.as_str()).collect();

    let volume = page
        .history_list
        .iter()
        .flat_map(|tx| tx.sends.iter().chain(tx.receives.iter()))
        .map(|item| {
            let price = page.token_dict.get(&item.token_id).and_then(|t| t.price).unwrap_or(0.0);
            item.amount * price
        });

    HistorySummary {
        transaction_count: page.history_list.len(),
        chains_involved: chains.into_iter().map(str::to_string).collect(),
        total_value_usd: sum_usd(volume),
    }
}

fn analyze_token_approvals(
    approvals: &[TokenApproval],
) -> (TokenApprovalAnalysis, Vec<RiskyApproval>) {
    let mut total_approvals = 0;
    let mut exposures = Vec::new();
    let mut spender_ids = BTreeSet::new();
    let mut spender_names = BTreeSet::new();
    let mut high_risk = Vec::new();

    for token in approvals {
        for spender in &token.spenders {
            total_approvals += 1;
            let exposure = spender.exposure(token.price);
            exposures.push(exposure);
            spender_ids.insert(spender.id.as_str());
            spender_names.insert(spender.display_name());

            if exposure > HIGH_RISK_EXPOSURE_USD {
                high_risk.push(RiskyApproval {
                    token_id: token.id.clone(),
                    symbol: token.symbol.clone(),
                    spender_id: spender.id.clone(),
                    spender_name: spender.display_name(),
                    exposure_usd: usd(exposure).round_dp(2),
                });
            }
        }
    }

    let analysis = TokenApprovalAnalysis {
        total_approvals,
        total_exposure_usd: sum_usd(exposures),
        high_risk_count: high_risk.len(),
        unique_spenders: spender_ids.len(),
        spender_list: spender_names.into_iter().collect(),
    };
    (analysis, high_risk)
}

fn analyze_nft_approvals(approvals: &NftApprovals) -> NftApprovalAnalysis {
    let spenders = approvals.tokens.iter().chain(approvals.contracts.iter()).map(|a| &a.spender);

    let mut ids = BTreeSet::new();
    let mut names = BTreeSet::new();
    for spender in spenders {
        ids.insert(spender.id.as_str());
        names.insert(
            spender
                .protocol
                .as_ref()
                .and_then(|p| p.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        );
    }

    NftApprovalAnalysis {
        total_nft_approvals: approvals.tokens.len(),
        total_contract_approvals: approvals.contracts.len(),
        unique_spenders: ids.len(),
        spender_list: names.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate_chain_id, ChainAllowList};

    fn eth() -> ChainId {
        validate_chain_id("eth", &ChainAllowList::default()).unwrap()
    }

    #[test]
    fn test_user_tokens_query_requires_chain_for_token() {
        let err = UserTokensQuery::resolve(None, Some("eth"), false, Pagination::default())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "chain_id"));

        let query =
            UserTokensQuery::resolve(Some(eth()), Some("ETH"), false, Pagination::default())
                .unwrap();
        assert_eq!(query, UserTokensQuery::Single { chain: eth(), token_id: "eth".to_string() });
    }

    #[test]
    fn test_user_protocols_query() {
        let query = UserProtocolsQuery::resolve(None, None, Some("simple")).unwrap();
        assert_eq!(
            query,
            UserProtocolsQuery::List { chain: None, detail_level: DetailLevel::Simple }
        );

        let query = UserProtocolsQuery::resolve(None, Some(eth()), None).unwrap();
        assert_eq!(
            query,
            UserProtocolsQuery::List { chain: Some(eth()), detail_level: DetailLevel::Complex }
        );

        let err = UserProtocolsQuery::resolve(None, None, Some("full")).unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "detail_level"));
    }

    #[test]
    fn test_history_filters_cap_page_count() {
        assert_eq!(history_filters(None, None, None).unwrap().page_count, 20);
        assert_eq!(history_filters(None, None, Some(5)).unwrap().page_count, 5);
        assert_eq!(history_filters(None, None, Some(400)).unwrap().page_count, 20);
        assert_eq!(history_filters(None, None, Some(0)).unwrap().page_count, 1);
        assert!(history_filters(None, Some(-1), None).is_err());
        assert!(history_filters(Some("bad token!"), None, None).is_err());
    }

    #[test]
    fn test_history_summary_prices_through_token_dict() {
        let page: HistoryPage = serde_json::from_str(
            r#"{
                "history_list": [
                    {"id":"0x1","chain":"eth","time_at":1.0,
                     "sends":[{"amount":2.0,"token_id":"eth"}],
                     "receives":[{"amount":100.0,"token_id":"usdc"}]},
                    {"id":"0x2","chain":"bsc","time_at":2.0,
                     "receives":[{"amount":5.0,"token_id":"unknown"}]},
                    {"id":"0x3","chain":"eth","time_at":3.0}
                ],
                "token_dict": {"eth":{"price":2000.0},"usdc":{"price":1.0}}
            }"#,
        )
        .unwrap();

        let summary = history_summary(&page);
        assert_eq!(summary.transaction_count, 3);
        assert_eq!(summary.chains_involved, vec!["bsc", "eth"]);
        assert_eq!(summary.total_value_usd, Decimal::new(4100, 0));
    }

    #[test]
    fn test_token_approval_analysis() {
        let approvals: Vec<TokenApproval> = serde_json::from_str(
            r#"[
                {"id":"0xusdc","chain":"eth","symbol":"USDC","price":1.0,"spenders":[
                    {"id":"0xrouter","value":50000.0,"protocol":{"id":"uni","name":"Uniswap"}},
                    {"id":"0xother","value":10.0}
                ]},
                {"id":"0xweth","chain":"eth","symbol":"WETH","price":2000.0,"spenders":[
                    {"id":"0xrouter","value":1.0,"exposure_usd":2000.0,
                     "protocol":{"id":"uni","name":"Uniswap"}}
                ]}
            ]"#,
        )
        .unwrap();

        let (analysis, risky) = analyze_token_approvals(&approvals);
        assert_eq!(analysis.total_approvals, 3);
        assert_eq!(analysis.total_exposure_usd, Decimal::new(52010, 0));
        assert_eq!(analysis.high_risk_count, 1);
        assert_eq!(analysis.unique_spenders, 2);
        assert_eq!(analysis.spender_list, vec!["Uniswap", "Unknown"]);
        assert_eq!(risky[0].spender_id, "0xrouter");
        assert_eq!(risky[0].symbol.as_deref(), Some("USDC"));
    }

    #[test]
    fn test_complex_summary_sums_portfolio_items() {
        let positions: Vec<ComplexProtocolPosition> = serde_json::from_str(
            r#"[{"id":"aave","chain":"eth","name":"Aave","portfolio_item_list":[
                {"name":"Lending","stats":
                    {"asset_usd_value":1000.5,"debt_usd_value":200.25,"net_usd_value":800.25}},
                {"name":"Rewards","stats":
                    {"asset_usd_value":10.0,"debt_usd_value":0.0,"net_usd_value":10.0}}
            ]}]"#,
        )
        .unwrap();

        let summary = complex_summary(&positions);
        assert_eq!(summary.total_net_usd_value, Decimal::new(81025, 2));
        assert_eq!(summary.total_asset_usd_value, Decimal::new(10105, 1));
        assert_eq!(summary.total_debt_usd_value, Decimal::new(20025, 2));
    }
}
