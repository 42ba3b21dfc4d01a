//! Advanced tools: net curves, pools, transaction simulation, gas and account units.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    debank::{
        chains::{pre_exec_chain_id, pre_exec_chain_names},
        DeBankClient,
    },
    error::{AppError, Result},
    types::{
        sum_usd, usd, AccountUnits, AccountUnitsResult, GasEstimate, GasPricesResult, GasTierView,
        NetCurvePoint, NetCurveResult, NetCurveSummary, PeakDay, PoolInfoResult, PoolStats,
        PoolSummary, PreExecRequest, PreExecResult, RiskLevel, SafetyAnalysis, SimulationResult,
        TransactionInput, Trend, TxObject, UsageAnalysis,
    },
    validation::{
        parse_evm_address, validate_calldata, validate_chain_id, validate_chain_ids,
        ChainAllowList, ChainId, EvmAddress,
    },
};

const WEI_PER_GWEI: f64 = 1_000_000_000.0;

/// Total sent, in USD, above which a simulation is flagged high risk.
pub const LARGE_TRANSFER_USD: f64 = 10_000.0;

/// Gas usage above which a simulation gets a warning.
pub const HIGH_GAS_UNITS: u64 = 500_000;

/// Typical gas usage shown next to gas prices.
pub const GAS_ESTIMATES: [GasEstimate; 3] = [
    GasEstimate {
        kind: "simple_transfer",
        gas_units: 21_000,
        description: "Simple ETH/native token transfer",
    },
    GasEstimate { kind: "token_transfer", gas_units: 65_000, description: "ERC-20 token transfer" },
    GasEstimate { kind: "swap", gas_units: 150_000, description: "Token swap on DEX" },
];

const GAS_NOTE: &str =
    "Multiply gas_units by price_gwei and divide by 1e9 to get cost in native token";

/// Which net curve to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetCurveQuery {
    /// One chain.
    Chain(ChainId),
    /// All chains, or the listed ones.
    Total(Vec<ChainId>),
}

impl NetCurveQuery {
    /// Resolve the net curve tool arguments; `chain_id` and `chain_ids` are
    /// mutually exclusive.
    pub fn resolve(
        chain_id: Option<&str>,
        chain_ids: Option<&str>,
        allowed: &ChainAllowList,
    ) -> Result<Self> {
        let chain_id = chain_id.map(str::trim).filter(|c| !c.is_empty());
        let chain_ids = chain_ids.map(str::trim).filter(|c| !c.is_empty());
        match (chain_id, chain_ids) {
            (Some(_), Some(_)) => {
                Err(AppError::validation("chain_id", "cannot be combined with chain_ids"))
            }
            (Some(chain), None) => Ok(Self::Chain(validate_chain_id(chain, allowed)?)),
            (None, Some(chains)) => Ok(Self::Total(validate_chain_ids(chains, allowed)?)),
            (None, None) => Ok(Self::Total(Vec::new())),
        }
    }
}

/// Validate a caller transaction into the pre-execution wire format.
///
/// `field` prefixes the names reported in validation errors.
pub fn validate_transaction(field: &str, tx: &TransactionInput) -> Result<TxObject> {
    let chain = tx.chain_id.trim().to_lowercase();
    let chain_id = pre_exec_chain_id(&chain).ok_or_else(|| {
        AppError::validation(
            format!("{field}.chain_id"),
            format!(
                "chain '{chain}' does not support transaction simulation; supported chains: {}",
                pre_exec_chain_names().join(", ")
            ),
        )
    })?;

    let from = parse_evm_address(&format!("{field}.from"), &tx.from)?;
    let to = parse_evm_address(&format!("{field}.to"), &tx.to)?;
    let value = match tx.value.as_deref() {
        Some(value) => validate_quantity(&format!("{field}.value"), value)?,
        None => "0x0".to_string(),
    };
    let data = match tx.data.as_deref() {
        Some(data) => validate_calldata(&format!("{field}.data"), data)?,
        None => "0x".to_string(),
    };

    let optional = |name: &str, value: Option<&str>| {
        value.map(|v| validate_quantity(&format!("{field}.{name}"), v)).transpose()
    };

    Ok(TxObject {
        chain_id,
        from: from.to_string(),
        to: to.to_string(),
        value,
        data,
        gas: optional("gas", tx.gas.as_deref())?,
        gas_price: optional("gas_price", tx.gas_price.as_deref())?,
        nonce: optional("nonce", tx.nonce.as_deref())?,
    })
}

/// A numeric quantity: `0x`-prefixed hex or plain decimal digits.
fn validate_quantity(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let valid = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()),
    };
    if !valid {
        return Err(AppError::validation(field, format!("must be a hex or decimal number: {raw}")));
    }
    Ok(trimmed.to_lowercase())
}

/// Handlers for the advanced tools.
#[derive(Clone)]
pub struct AdvancedService {
    client: Arc<DeBankClient>,
}

impl AdvancedService {
    /// Create a new advanced service.
    pub fn new(client: Arc<DeBankClient>) -> Self {
        Self { client }
    }

    /// 24h net worth curve with a trend summary.
    pub async fn get_user_net_curve(
        &self,
        user: EvmAddress,
        query: NetCurveQuery,
    ) -> Result<NetCurveResult> {
        let (chain_label, points) = match &query {
            NetCurveQuery::Chain(chain) => {
                (chain.to_string(), self.client.get_user_chain_net_curve(&user, chain).await?)
            }
            NetCurveQuery::Total(chains) => {
                let points = self.client.get_user_total_net_curve(&user, chains).await?;
                ("all_chains".to_string(), points)
            }
        };

        Ok(NetCurveResult {
            address: user.to_string(),
            chain_id: chain_label,
            count: points.len(),
            summary: net_curve_summary(&points),
            data_points: points,
        })
    }

    /// Pool details with derived metrics.
    pub async fn get_pool_info(&self, pool_id: String, chain: ChainId) -> Result<PoolInfoResult> {
        let pool = self.client.get_pool(&pool_id, &chain).await?;
        let summary = pool
            .stats
            .as_ref()
            .map(|stats| pool_summary(stats, &pool.protocol_id, pool.name.clone()));
        Ok(PoolInfoResult { pool, summary })
    }

    /// Pre-execute (with safety analysis) or explain a transaction.
    pub async fn simulate_transaction(
        &self,
        request: PreExecRequest,
        explain_only: bool,
    ) -> Result<SimulationResult> {
        if explain_only {
            let explanation = self.client.explain_tx(&request).await?;
            return Ok(SimulationResult::Explained { explanation });
        }

        let result = self.client.pre_exec_tx(&request).await?;
        let safety_analysis = analyze_safety(&result);
        tracing::info!(
            risk = ?safety_analysis.risk_level,
            will_succeed = safety_analysis.will_succeed,
            "Transaction simulated"
        );
        Ok(SimulationResult::Simulated { result, safety_analysis })
    }

    /// Gas price tiers in gwei with standard usage estimates.
    pub async fn get_gas_prices(&self, chain: ChainId) -> Result<GasPricesResult> {
        let tiers = self.client.get_gas_market(&chain).await?;
        let gas_tiers = tiers
            .into_iter()
            .map(|tier| GasTierView { price_gwei: tier.price / WEI_PER_GWEI, tier })
            .collect();

        Ok(GasPricesResult {
            chain: chain.to_string(),
            gas_tiers,
            estimates: GAS_ESTIMATES.to_vec(),
            note: GAS_NOTE,
        })
    }

    /// Units balance with a usage analysis.
    pub async fn get_account_units(&self) -> Result<AccountUnitsResult> {
        let units = self.client.get_account_units().await?;
        let usage_analysis = usage_analysis(&units);
        Ok(AccountUnitsResult { units, usage_analysis })
    }
}

fn net_curve_summary(points: &[NetCurvePoint]) -> Option<NetCurveSummary> {
    let (first, last) = (points.first()?, points.last()?);
    let start = usd(first.usd_value);
    let change = usd(last.usd_value) - start;
    let change_percent = if start > Decimal::ZERO {
        (change / start * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    };
    let trend = if change > Decimal::ZERO {
        Trend::Up
    } else if change < Decimal::ZERO {
        Trend::Down
    } else {
        Trend::Flat
    };

    Some(NetCurveSummary {
        start_value_usd: first.usd_value,
        end_value_usd: last.usd_value,
        change_usd: change.round_dp(2),
        change_percent,
        trend,
    })
}

fn pool_summary(stats: &PoolStats, protocol: &str, pool_name: Option<String>) -> PoolSummary {
    let tvl = usd(stats.deposit_usd_value);
    let users = Decimal::from(stats.deposit_user_count);
    let (average_deposit_usd, valuable_user_ratio_pct) = if users > Decimal::ZERO {
        (
            (tvl / users).round_dp(2),
            (Decimal::from(stats.deposit_valuable_user_count) / users * Decimal::ONE_HUNDRED)
                .round_dp(2),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    PoolSummary {
        total_value_locked_usd: tvl,
        total_users: stats.deposit_user_count,
        valuable_users: stats.deposit_valuable_user_count,
        average_deposit_usd,
        valuable_user_ratio_pct,
        protocol: protocol.to_string(),
        pool_name,
    }
}

/// Flag failing, draining or unusually expensive transactions.
pub fn analyze_safety(result: &PreExecResult) -> SafetyAnalysis {
    let mut warnings = Vec::new();
    let mut recommendations = Vec::new();
    let mut risk = RiskLevel::Low;

    let will_succeed = result.pre_exec.success;
    if !will_succeed {
        warnings.push("Transaction will FAIL if executed".to_string());
        risk = RiskLevel::Critical;
        if let Some(error) = &result.pre_exec.error {
            warnings.push(format!("Error: {}", error.msg.as_deref().unwrap_or("Unknown error")));
        }
    }

    let change = &result.balance_change;
    let sends_tokens = !change.send_token_list.is_empty();
    let sends_nfts = !change.send_nft_list.is_empty();

    if sends_tokens {
        let sent = sum_usd(change.send_token_list.iter().map(|t| t.amount_usd.unwrap_or(0.0)));
        if sent > usd(LARGE_TRANSFER_USD) {
            warnings.push(format!("Large token transfer: ${sent}"));
            risk = risk.max(RiskLevel::High);
        }
    }

    if sends_nfts {
        warnings.push(format!("Transferring {} NFT(s)", change.send_nft_list.len()));
    }

    if change.receive_token_list.is_empty() && (sends_tokens || sends_nfts) {
        warnings
            .push("Sending assets but receiving nothing; verify this is intentional".to_string());
        risk = risk.max(RiskLevel::Medium);
    }

    let gas_used = result.gas.as_ref().map_or(0, |g| g.gas_used);
    if gas_used > HIGH_GAS_UNITS {
        warnings.push(format!("High gas usage: {gas_used} units"));
    }

    if result.is_multisig {
        recommendations
            .push("This is a multisig transaction requiring multiple signatures".to_string());
    }
    if risk >= RiskLevel::Medium {
        recommendations.push("Review transaction details carefully before proceeding".to_string());
    }
    if sends_tokens || sends_nfts {
        recommendations.push("Verify recipient address is correct".to_string());
    }

    SafetyAnalysis {
        risk_level: risk,
        warnings,
        recommendations,
        will_succeed,
        estimated_gas: gas_used,
    }
}

fn usage_analysis(units: &AccountUnits) -> Option<UsageAnalysis> {
    let peak =
        units.stats.iter().reduce(|peak, day| if day.usage > peak.usage { day } else { peak })?;
    let total_usage: i64 = units.stats.iter().map(|d| d.usage).sum();
    let days = units.stats.len();
    let avg = Decimal::from(total_usage) / Decimal::from(days as u64);

    let days_remaining =
        (avg > Decimal::ZERO).then(|| (Decimal::from(units.balance) / avg).round_dp(1));

    Some(UsageAnalysis {
        total_usage,
        days_reported: days,
        avg_daily_usage: avg.round_dp(1),
        days_remaining_at_current_rate: days_remaining,
        peak_day: PeakDay { date: peak.date.clone(), usage: peak.usage },
        recommendation: usage_recommendation(days_remaining),
    })
}

/// Advice based on how long the balance lasts at the current rate.
pub fn usage_recommendation(days_remaining: Option<Decimal>) -> String {
    let Some(days) = days_remaining else {
        return "No recent usage detected. Your balance is stable.".to_string();
    };
    let days = days.round_dp(1);

    if days < Decimal::from(7) {
        format!(
            "WARNING: Only {days} days of usage remaining at current rate. \
             Consider purchasing more units."
        )
    } else if days < Decimal::from(14) {
        format!("CAUTION: {days} days of usage remaining. Monitor your consumption closely.")
    } else if days < Decimal::from(30) {
        format!("GOOD: {days} days of usage remaining. Your balance is adequate.")
    } else {
        format!("EXCELLENT: {days} days of usage remaining. Your balance is healthy.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(chain: &str) -> TransactionInput {
        TransactionInput {
            chain_id: chain.to_string(),
            from: "0xD8dA6BF26964aF9D7eEd9e03E53415D37aA96045".to_string(),
            to: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".to_string(),
            value: None,
            data: Some("0xA9059CBB".to_string()),
            gas: Some("21000".to_string()),
            gas_price: None,
            nonce: None,
        }
    }

    #[test]
    fn test_validate_transaction() {
        let object = validate_transaction("transaction", &tx("ETH")).unwrap();
        assert_eq!(object.chain_id, 1);
        assert_eq!(object.from, "0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
        assert_eq!(object.value, "0x0");
        assert_eq!(object.data, "0xa9059cbb");
        assert_eq!(object.gas.as_deref(), Some("21000"));
    }

    #[test]
    fn test_validate_transaction_rejects_unsupported_chain() {
        let err = validate_transaction("transaction", &tx("base")).unwrap_err();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "transaction.chain_id");
                assert!(message.contains("eth"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_transaction_rejects_bad_fields() {
        let mut bad = tx("eth");
        bad.to = "0x123".to_string();
        assert!(validate_transaction("transaction", &bad).is_err());

        let mut bad = tx("eth");
        bad.data = Some("0xzz".to_string());
        assert!(validate_transaction("transaction", &bad).is_err());

        let mut bad = tx("eth");
        bad.value = Some("1.5".to_string());
        let err = validate_transaction("pending_transactions[0]", &bad).unwrap_err();
        assert!(err.to_string().contains("pending_transactions[0].value"));
    }

    #[test]
    fn test_net_curve_query() {
        let chains = ChainAllowList::default();
        assert_eq!(
            NetCurveQuery::resolve(None, None, &chains).unwrap(),
            NetCurveQuery::Total(vec![])
        );
        assert!(matches!(
            NetCurveQuery::resolve(Some("eth"), None, &chains).unwrap(),
            NetCurveQuery::Chain(_)
        ));
        assert!(matches!(
            NetCurveQuery::resolve(None, Some("eth,bsc"), &chains).unwrap(),
            NetCurveQuery::Total(ref c) if c.len() == 2
        ));
        assert!(NetCurveQuery::resolve(Some("eth"), Some("bsc"), &chains).is_err());
    }

    #[test]
    fn test_net_curve_summary() {
        let points = vec![
            NetCurvePoint { timestamp: 1.0, usd_value: 1000.0 },
            NetCurvePoint { timestamp: 2.0, usd_value: 900.0 },
            NetCurvePoint { timestamp: 3.0, usd_value: 1100.0 },
        ];
        let summary = net_curve_summary(&points).unwrap();
        assert_eq!(summary.change_usd, Decimal::from(100));
        assert_eq!(summary.change_percent, Decimal::from(10));
        assert_eq!(summary.trend, Trend::Up);

        assert!(net_curve_summary(&[]).is_none());

        let flat = vec![NetCurvePoint { timestamp: 1.0, usd_value: 0.0 }];
        let summary = net_curve_summary(&flat).unwrap();
        assert_eq!(summary.trend, Trend::Flat);
        assert_eq!(summary.change_percent, Decimal::ZERO);
    }

    #[test]
    fn test_pool_summary() {
        let stats: PoolStats = serde_json::from_str(
            r#"{"deposit_usd_value":1000000.0,"deposit_user_count":400,
                "deposit_valuable_user_count":100}"#,
        )
        .unwrap();
        let summary = pool_summary(&stats, "uniswap3", Some("USDC/WETH".to_string()));
        assert_eq!(summary.average_deposit_usd, Decimal::from(2500));
        assert_eq!(summary.valuable_user_ratio_pct, Decimal::from(25));

        let empty: PoolStats = serde_json::from_str(r#"{"deposit_usd_value":0.0}"#).unwrap();
        let summary = pool_summary(&empty, "uniswap3", None);
        assert_eq!(summary.average_deposit_usd, Decimal::ZERO);
    }

    #[test]
    fn test_safety_analysis_failing_drain() {
        let result: PreExecResult = serde_json::from_str(
            r#"{
                "pre_exec": {"success": false, "error": {"msg": "execution reverted"}},
                "balance_change": {"send_token_list": [{"amount_usd": 25000.0}]},
                "gas": {"gas_used": 600000},
                "is_multisig": false
            }"#,
        )
        .unwrap();

        let analysis = analyze_safety(&result);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert!(!analysis.will_succeed);
        assert_eq!(analysis.estimated_gas, 600_000);
        assert!(analysis.warnings.iter().any(|w| w.contains("execution reverted")));
        assert!(analysis.warnings.iter().any(|w| w.starts_with("Large token transfer")));
        assert!(analysis.warnings.iter().any(|w| w.starts_with("High gas usage")));
        assert!(analysis.recommendations.iter().any(|r| r.contains("recipient")));
    }

    #[test]
    fn test_safety_analysis_clean_swap() {
        let result: PreExecResult = serde_json::from_str(
            r#"{
                "pre_exec": {"success": true, "error": null},
                "balance_change": {
                    "send_token_list": [{"amount_usd": 100.0}],
                    "receive_token_list": [{"amount_usd": 99.5}]
                },
                "gas": {"gas_used": 150000}
            }"#,
        )
        .unwrap();

        let analysis = analyze_safety(&result);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.recommendations, vec!["Verify recipient address is correct"]);
    }

    #[test]
    fn test_safety_analysis_one_way_nft_transfer() {
        let result: PreExecResult = serde_json::from_str(
            r#"{"pre_exec":{"success":true},
                "balance_change":{"send_nft_list":[{"id":"1"}]},
                "is_multisig":true}"#,
        )
        .unwrap();

        let analysis = analyze_safety(&result);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.recommendations.len(), 3);
    }

    #[test]
    fn test_usage_analysis() {
        let units: AccountUnits = serde_json::from_str(
            r#"{"balance":1000,"stats":[
                {"usage":100,"remains":1000,"date":"2025-01-11"},
                {"usage":300,"remains":1100,"date":"2025-01-10"},
                {"usage":300,"remains":1400,"date":"2025-01-09"}
            ]}"#,
        )
        .unwrap();

        let analysis = usage_analysis(&units).unwrap();
        assert_eq!(analysis.total_usage, 700);
        assert_eq!(analysis.avg_daily_usage, Decimal::new(2333, 1));
        assert_eq!(analysis.days_remaining_at_current_rate, Some(Decimal::new(43, 1)));
        assert_eq!(analysis.peak_day.date, "2025-01-10");
        assert!(analysis.recommendation.starts_with("WARNING"));

        let empty: AccountUnits = serde_json::from_str(r#"{"balance":1000,"stats":[]}"#).unwrap();
        assert!(usage_analysis(&empty).is_none());
    }

    #[test]
    fn test_usage_recommendation_thresholds() {
        assert!(usage_recommendation(None).starts_with("No recent usage"));
        assert!(usage_recommendation(Some(Decimal::from(10))).starts_with("CAUTION"));
        assert!(usage_recommendation(Some(Decimal::from(20))).starts_with("GOOD"));
        assert!(usage_recommendation(Some(Decimal::from(30))).starts_with("EXCELLENT"));
    }
}
