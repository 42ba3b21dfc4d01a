//! Common utilities for integration tests.
//!
//! Every test runs against a local `wiremock` server standing in for the
//! DeBank API.

#![allow(dead_code)]

use std::time::Duration;

use debank_mcp::{AccessKey, Config, DeBankServer, RetryPolicy};
use rmcp::ErrorData as McpError;
use wiremock::MockServer;

/// Access key the test servers are configured with.
pub const ACCESS_KEY: &str = "test-access-key";

/// A well-known wallet, in mixed case.
pub const WALLET: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

/// The same wallet, normalized.
pub const WALLET_LOWER: &str = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";

/// Configuration pointing at the mock server with short backoff delays.
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::new(AccessKey::new(ACCESS_KEY));
    config.base_url = base_url.to_string();
    config.timeout = Duration::from_secs(2);
    config.retry = RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(400),
    };
    config
}

/// Start a mock upstream and a server wired to it.
pub async fn start() -> (MockServer, DeBankServer) {
    let upstream = MockServer::start().await;
    let server = DeBankServer::new(test_config(&upstream.uri())).expect("server should build");
    (upstream, server)
}

/// The error kind carried in an MCP error's data.
pub fn error_type(err: &McpError) -> String {
    err.data
        .as_ref()
        .and_then(|d| d.get("type"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Parse a tool's JSON output.
pub fn parse(output: Result<String, McpError>) -> serde_json::Value {
    let json = output.unwrap_or_else(|e| panic!("tool failed: {e:?}"));
    serde_json::from_str(&json).expect("tool output should be JSON")
}
