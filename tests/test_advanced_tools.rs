//! Integration tests for the advanced tools.
//!
//! Run with: `cargo test --test test_advanced_tools`

mod common;

use debank_mcp::{
    mcp::{GetGasPricesInput, GetPoolInfoInput, GetUserNetCurveInput, SimulateTransactionInput},
    types::TransactionInput,
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use wiremock::{
    matchers::{any, body_partial_json, method, path, query_param},
    Mock, ResponseTemplate,
};

const ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";

fn transfer(chain_id: &str) -> TransactionInput {
    TransactionInput {
        chain_id: chain_id.to_string(),
        from: common::WALLET.to_string(),
        to: ROUTER.to_string(),
        value: Some("0xde0b6b3a7640000".to_string()),
        data: None,
        gas: None,
        gas_price: None,
        nonce: None,
    }
}

fn simulate(
    tx: TransactionInput,
    explain_only: Option<bool>,
) -> Parameters<SimulateTransactionInput> {
    Parameters(SimulateTransactionInput {
        transaction: tx,
        pending_transactions: None,
        explain_only,
    })
}

#[tokio::test]
async fn test_simulation_sends_numeric_chain_id() {
    let (upstream, server) = common::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/wallet/pre_exec_tx"))
        .and(body_partial_json(json!({
            "tx": {
                "chainId": 1,
                "from": common::WALLET_LOWER,
                "to": ROUTER.to_lowercase(),
                "value": "0xde0b6b3a7640000",
                "data": "0x"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pre_exec": { "success": true, "error": null },
            "balance_change": {
                "send_token_list": [ { "amount_usd": 15000.0, "symbol": "ETH" } ],
                "receive_token_list": [],
                "send_nft_list": [],
                "receive_nft_list": []
            },
            "gas": { "gas_used": 21000 },
            "is_multisig": false
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result =
        common::parse(server.debank_simulate_transaction(simulate(transfer("eth"), None)).await);

    let safety = &result["safety_analysis"];
    assert_eq!(safety["will_succeed"], true);
    assert_eq!(safety["risk_level"], "high");
    assert_eq!(safety["estimated_gas"], 21000);
    assert!(safety["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .any(|w| w.as_str().unwrap().starts_with("Large token transfer")));
    assert_eq!(result["balance_change"]["send_token_list"][0]["symbol"], "ETH");
}

#[tokio::test]
async fn test_failing_simulation_is_critical() {
    let (upstream, server) = common::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/wallet/pre_exec_tx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pre_exec": { "success": false, "error": { "msg": "execution reverted" } },
            "gas": { "gas_used": 0 }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result =
        common::parse(server.debank_simulate_transaction(simulate(transfer("bsc"), None)).await);

    assert_eq!(result["safety_analysis"]["risk_level"], "critical");
    assert_eq!(result["safety_analysis"]["will_succeed"], false);
    assert!(result["safety_analysis"]["warnings"]
        .as_array()
        .unwrap()
        .contains(&json!("Error: execution reverted")));
}

#[tokio::test]
async fn test_explain_only_passes_response_through() {
    let (upstream, server) = common::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/wallet/explain_tx"))
        .and(body_partial_json(json!({ "tx": { "chainId": 137 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "abi": { "func": "transfer", "params": [] },
            "actions": [ { "type": "send_token" } ]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let explain = simulate(transfer("matic"), Some(true));
    let result = common::parse(server.debank_simulate_transaction(explain).await);

    assert_eq!(result["abi"]["func"], "transfer");
    assert!(result.get("safety_analysis").is_none());
}

#[tokio::test]
async fn test_simulation_rejects_unsupported_chain() {
    let (upstream, server) = common::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(500)).expect(0).mount(&upstream).await;

    let err = server
        .debank_simulate_transaction(simulate(transfer("base"), None))
        .await
        .unwrap_err();
    assert_eq!(common::error_type(&err), "validation_error");
    assert!(err.message.contains("does not support transaction simulation"));

    let mut bad_pending = transfer("eth");
    bad_pending.data = Some("0xzz".to_string());
    let err = server
        .debank_simulate_transaction(Parameters(SimulateTransactionInput {
            transaction: transfer("eth"),
            pending_transactions: Some(vec![bad_pending]),
            explain_only: None,
        }))
        .await
        .unwrap_err();
    assert!(err.message.contains("pending_transactions[0].data"));
}

#[tokio::test]
async fn test_gas_prices_in_gwei() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/wallet/gas_market"))
        .and(query_param("chain_id", "eth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "level": "slow", "price": 12_000_000_000.0,
              "front_tx_count": 0, "estimated_seconds": 120 },
            { "level": "normal", "price": 15_500_000_000.0,
              "front_tx_count": 0, "estimated_seconds": 30 },
            { "level": "fast", "price": 20_000_000_000.0,
              "front_tx_count": 0, "estimated_seconds": 10 }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_gas_prices(Parameters(GetGasPricesInput { chain_id: "eth".to_string() }))
            .await,
    );

    assert_eq!(result["chain"], "eth");
    assert_eq!(result["gas_tiers"][0]["price_gwei"], 12.0);
    assert_eq!(result["gas_tiers"][1]["price_gwei"], 15.5);
    assert_eq!(result["gas_tiers"][2]["level"], "fast");
    assert_eq!(result["estimates"][0]["gas_units"], 21000);
}

#[tokio::test]
async fn test_account_units_usage_analysis() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/account/units"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "balance": 1000,
            "stats": [
                { "usage": 100, "remains": 1300, "date": "2024-01-13" },
                { "usage": 300, "remains": 1000, "date": "2024-01-14" }
            ]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(server.debank_get_account_units().await);

    let analysis = &result["usage_analysis"];
    assert_eq!(result["balance"], 1000);
    assert_eq!(analysis["total_usage"], 400);
    assert_eq!(analysis["avg_daily_usage"], 200.0);
    assert_eq!(analysis["days_remaining_at_current_rate"], 5.0);
    assert_eq!(analysis["peak_day"]["date"], "2024-01-14");
    assert!(analysis["recommendation"].as_str().unwrap().starts_with("WARNING"));
}

#[tokio::test]
async fn test_total_net_curve_trend() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/total_net_curve"))
        .and(query_param("chain_ids", "eth,arb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "timestamp": 1700000000.0, "usd_value": 1000.0 },
            { "timestamp": 1700003600.0, "usd_value": 1100.0 },
            { "timestamp": 1700007200.0, "usd_value": 950.0 }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_net_curve(Parameters(GetUserNetCurveInput {
                address: common::WALLET.to_string(),
                chain_id: None,
                chain_ids: Some("eth, arb".to_string()),
            }))
            .await,
    );

    assert_eq!(result["chain_id"], "all_chains");
    assert_eq!(result["count"], 3);
    assert_eq!(result["summary"]["change_usd"], -50.0);
    assert_eq!(result["summary"]["change_percent"], -5.0);
    assert_eq!(result["summary"]["trend"], "down");
}

#[tokio::test]
async fn test_empty_net_curve_has_no_summary() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/chain_net_curve"))
        .and(query_param("chain_id", "base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_net_curve(Parameters(GetUserNetCurveInput {
                address: common::WALLET.to_string(),
                chain_id: Some("base".to_string()),
                chain_ids: None,
            }))
            .await,
    );

    assert_eq!(result["count"], 0);
    assert!(result["summary"].is_null());
}

#[tokio::test]
async fn test_pool_info_summary() {
    let (upstream, server) = common::start().await;
    let pool_id = "0x88e6a0c2ddd26feeb64f039a2c41296fcb3f5640";

    Mock::given(method("GET"))
        .and(path("/v1/pool"))
        .and(query_param("id", pool_id))
        .and(query_param("chain_id", "eth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": pool_id,
            "chain": "eth",
            "protocol_id": "uniswap3",
            "name": "USDC/WETH 0.05%",
            "stats": {
                "deposit_usd_value": 1_000_000.0,
                "deposit_user_count": 400,
                "deposit_valuable_user_count": 100
            }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_pool_info(Parameters(GetPoolInfoInput {
                pool_id: pool_id.to_uppercase().replace("0X", "0x"),
                chain_id: "eth".to_string(),
            }))
            .await,
    );

    assert_eq!(result["protocol_id"], "uniswap3");
    assert_eq!(result["summary"]["average_deposit_usd"], 2500.0);
    assert_eq!(result["summary"]["valuable_user_ratio_pct"], 25.0);
    assert_eq!(result["summary"]["total_users"], 400);
}
