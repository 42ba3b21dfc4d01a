//! Integration tests for the wallet portfolio tools.
//!
//! Run with: `cargo test --test test_portfolio_tools`

mod common;

use debank_mcp::mcp::{
    GetUserApprovalsInput, GetUserHistoryInput, GetUserNftsInput, GetUserProtocolsInput,
    GetUserTokensInput,
};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

fn held_token(id: &str, price: f64, amount: f64) -> serde_json::Value {
    json!({
        "id": id,
        "chain": "eth",
        "name": id,
        "symbol": id.to_uppercase(),
        "decimals": 18,
        "price": price,
        "amount": amount,
        "raw_amount": amount * 1e18
    })
}

fn tokens_input(limit: Option<i64>, offset: Option<i64>) -> Parameters<GetUserTokensInput> {
    Parameters(GetUserTokensInput {
        address: common::WALLET.to_string(),
        chain_id: Some("eth".to_string()),
        token_id: None,
        is_all: None,
        limit,
        offset,
    })
}

#[tokio::test]
async fn test_user_tokens_paginated_locally() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/token_list"))
        .and(query_param("id", common::WALLET_LOWER))
        .and(query_param("chain_id", "eth"))
        .and(query_param("is_all", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            held_token("eth", 3000.0, 1.5),
            held_token("aave", 100.0, 2.0),
            held_token("uni", 10.0, 0.5)
        ])))
        .expect(2)
        .mount(&upstream)
        .await;

    let first = common::parse(server.debank_get_user_tokens(tokens_input(Some(2), None)).await);
    assert_eq!(first["pagination"]["total_count"], 3);
    assert_eq!(first["pagination"]["returned_count"], 2);
    assert_eq!(first["pagination"]["has_more"], true);
    assert_eq!(first["pagination"]["next_offset"], 2);
    assert_eq!(first["total_usd_value"], 4700.0);

    let last = common::parse(server.debank_get_user_tokens(tokens_input(Some(2), Some(2))).await);
    assert_eq!(last["pagination"]["returned_count"], 1);
    assert_eq!(last["pagination"]["has_more"], false);
    assert!(last["pagination"]["next_offset"].is_null());
    assert_eq!(last["tokens"][0]["id"], "uni");
    assert_eq!(last["total_usd_value"], 5.0);
}

#[tokio::test]
async fn test_user_token_requires_chain() {
    let (_upstream, server) = common::start().await;

    let err = server
        .debank_get_user_tokens(Parameters(GetUserTokensInput {
            address: common::WALLET.to_string(),
            chain_id: None,
            token_id: Some("eth".to_string()),
            is_all: None,
            limit: None,
            offset: None,
        }))
        .await
        .unwrap_err();
    assert_eq!(common::error_type(&err), "validation_error");
    assert!(err.message.contains("chain_id"));
}

#[tokio::test]
async fn test_user_nfts_count_collections() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/all_nft_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "1", "chain": "eth",
              "contract_id": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d",
              "name": "Ape #1", "usd_price": 40000.0, "amount": 1 },
            { "id": "2", "chain": "eth",
              "contract_id": "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d",
              "name": "Ape #2", "usd_price": 41000.5, "amount": 1 },
            { "id": "7", "chain": "eth",
              "contract_id": "0x60e4d786628fea6478f785a6d7e704777c86a7c6",
              "name": "Mutant #7", "usd_price": null, "amount": 1 }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_nfts(Parameters(GetUserNftsInput {
                address: common::WALLET.to_string(),
                chain_id: None,
                is_all: None,
                limit: None,
                offset: None,
            }))
            .await,
    );

    assert_eq!(result["chain_id"], "all_chains");
    assert_eq!(result["collection_count"], 2);
    assert_eq!(result["total_usd_value"], 81000.5);
    assert_eq!(result["nfts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_user_protocols_simple_summary() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/all_simple_protocol_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "aave3", "chain": "eth", "name": "Aave V3",
              "net_usd_value": 800.0, "asset_usd_value": 1000.0, "debt_usd_value": 200.0 },
            { "id": "lido", "chain": "eth", "name": "Lido",
              "net_usd_value": 0.3, "asset_usd_value": 0.3, "debt_usd_value": 0.0 }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_protocols(Parameters(GetUserProtocolsInput {
                address: common::WALLET.to_string(),
                protocol_id: None,
                chain_id: None,
                detail_level: Some("simple".to_string()),
            }))
            .await,
    );

    assert_eq!(result["detail_level"], "simple");
    assert_eq!(result["protocol_count"], 2);
    assert_eq!(result["summary"]["total_net_usd_value"], 800.3);
    assert_eq!(result["summary"]["total_debt_usd_value"], 200.0);
}

#[tokio::test]
async fn test_user_protocols_rejects_unknown_detail_level() {
    let (_upstream, server) = common::start().await;

    let err = server
        .debank_get_user_protocols(Parameters(GetUserProtocolsInput {
            address: common::WALLET.to_string(),
            protocol_id: None,
            chain_id: None,
            detail_level: Some("verbose".to_string()),
        }))
        .await
        .unwrap_err();
    assert_eq!(common::error_type(&err), "validation_error");
}

#[tokio::test]
async fn test_user_history_summary() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/all_history_list"))
        .and(query_param("page_count", "20"))
        .and(query_param("start_time", "1700000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history_list": [
                { "id": "0xaa", "chain": "eth", "time_at": 1700000100.0, "cate_id": "send",
                  "sends": [ { "amount": 2.0, "token_id": "eth", "to_addr": "0x01" } ],
                  "receives": [] },
                { "id": "0xbb", "chain": "arb", "time_at": 1700000200.0, "cate_id": null,
                  "sends": [],
                  "receives": [ { "amount": 50.0, "token_id": "arb_usdc" },
                                { "amount": 9.0, "token_id": "unpriced" } ] }
            ],
            "token_dict": {
                "eth": { "price": 3000.0, "symbol": "ETH" },
                "arb_usdc": { "price": 1.0, "symbol": "USDC" }
            },
            "project_dict": {},
            "cate_dict": {}
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_history(Parameters(GetUserHistoryInput {
                address: common::WALLET.to_string(),
                chain_id: None,
                token_id: None,
                start_time: Some(1_700_000_000),
                page_count: Some(100),
            }))
            .await,
    );

    assert_eq!(result["filters"]["page_count"], 20);
    assert_eq!(result["summary"]["transaction_count"], 2);
    assert_eq!(result["summary"]["chains_involved"], json!(["arb", "eth"]));
    assert_eq!(result["summary"]["total_value_usd"], 6050.0);
    assert_eq!(result["history_list"][0]["sends"][0]["to_addr"], "0x01");
}

#[tokio::test]
async fn test_token_approvals_security_analysis() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/token_authorized_list"))
        .and(query_param("chain_id", "eth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
                "chain": "eth",
                "symbol": "USDC",
                "price": 1.0,
                "spenders": [
                    { "id": "0x1111111254eeb25477b68fb85ed929f73a960582", "value": 50000.0,
                      "exposure_usd": 25000.0, "protocol": { "id": "1inch", "name": "1inch" } },
                    { "id": "0x000000000022d473030f116ddee9f6b43ac78ba3", "value": 100.0,
                      "exposure_usd": null, "protocol": null }
                ]
            },
            {
                "id": "eth_weth",
                "chain": "eth",
                "symbol": "WETH",
                "price": 3000.0,
                "spenders": [
                    { "id": "0x1111111254eeb25477b68fb85ed929f73a960582", "value": 1.0,
                      "exposure_usd": null, "protocol": { "id": "1inch", "name": "1inch" } }
                ]
            }
        ])))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_approvals(Parameters(GetUserApprovalsInput {
                address: common::WALLET.to_string(),
                chain_id: "eth".to_string(),
                approval_type: None,
            }))
            .await,
    );

    let analysis = &result["security_analysis"];
    assert_eq!(result["approval_type"], "token");
    assert_eq!(analysis["total_approvals"], 3);
    assert_eq!(analysis["total_exposure_usd"], 28100.0);
    assert_eq!(analysis["high_risk_count"], 1);
    assert_eq!(analysis["unique_spenders"], 2);
    assert_eq!(analysis["spender_list"], json!(["1inch", "Unknown"]));
    assert_eq!(result["high_risk_approvals"][0]["spender_name"], "1inch");
}

#[tokio::test]
async fn test_nft_approvals() {
    let (upstream, server) = common::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/user/nft_authorized_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tokens": [
                { "spender": { "id": "0x00000000000000adc04c56bf30ac9d3c0aaf14dc",
                               "protocol": { "id": "opensea", "name": "OpenSea" } } }
            ],
            "contracts": [
                { "spender": { "id": "0x00000000000000adc04c56bf30ac9d3c0aaf14dc",
                               "protocol": { "id": "opensea", "name": "OpenSea" } } },
                { "spender": { "id": "0x29469395eaf6f95920e59f858042f0e28d98a20b",
                               "protocol": null } }
            ],
            "total": 3
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let result = common::parse(
        server
            .debank_get_user_approvals(Parameters(GetUserApprovalsInput {
                address: common::WALLET.to_string(),
                chain_id: "eth".to_string(),
                approval_type: Some("NFT".to_string()),
            }))
            .await,
    );

    let analysis = &result["security_analysis"];
    assert_eq!(result["approval_type"], "nft");
    assert_eq!(analysis["total_nft_approvals"], 1);
    assert_eq!(analysis["total_contract_approvals"], 2);
    assert_eq!(analysis["unique_spenders"], 2);
    assert_eq!(result["total"], 3);
}
