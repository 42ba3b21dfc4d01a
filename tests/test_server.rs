//! Integration tests for server initialization.
//!
//! Run with: `cargo test --test test_server`

mod common;

use debank_mcp::{AppError, Config};
use rmcp::model::ServerInfo;
use rmcp::ServerHandler;

/// Test server info.
#[tokio::test]
async fn test_server_info() {
    let (_upstream, server) = common::start().await;
    let info: ServerInfo = server.get_info();

    assert_eq!(info.server_info.name, "debank-mcp");
    assert!(!info.server_info.version.is_empty());
    assert!(info.capabilities.tools.is_some());
}

/// Building the server issues no request.
#[tokio::test]
async fn test_server_startup_is_lazy() {
    let upstream = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::any())
        .respond_with(wiremock::ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let server = debank_mcp::DeBankServer::new(common::test_config(&upstream.uri()));
    tokio_test::assert_ok!(server);
}

/// A missing access key is fatal before any server exists.
#[test]
fn test_missing_access_key_fails_fast() {
    let result = Config::from_lookup(|name| match name {
        "DEBANK_BASE_URL" => Some("http://localhost:1".to_string()),
        _ => None,
    });
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, AppError::Config(_)));
    assert!(err.to_string().contains("DEBANK_ACCESS_KEY"));
}
