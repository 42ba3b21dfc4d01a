//! DeBank Pro API client.
//!
//! Every request goes through [`DeBankClient::execute`], which attaches the
//! access key, applies the per-attempt timeout, classifies the response and
//! retries rate-limit and transient faults under the configured [`RetryPolicy`].

use std::{fmt, time::Duration};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, RETRY_AFTER},
    Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{endpoints, retry::parse_retry_after, RetryPolicy};
use crate::{
    config::Config,
    error::{AppError, Result},
    types::{
        AccountUnits, Chain, ChainUsdValue, ComplexProtocolPosition, GasTier, HistoryFilters,
        HistoryPage, NetCurvePoint, Nft, NftApprovals, Pool, PreExecRequest, PreExecResult,
        Protocol, SimpleProtocolPosition, Token, TokenApproval, TokenHistoricalPrice, TokenHolder,
        TotalBalance, TxExplanation,
    },
    validation::{ChainId, EvmAddress},
};

/// A single upstream call: method, path, query and optional JSON body.
#[derive(Debug, Clone)]
struct Request {
    method: Method,
    path: &'static str,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl Request {
    fn get(path: &'static str) -> Self {
        Self { method: Method::GET, path, query: Vec::new(), body: None }
    }

    fn post<B: Serialize>(path: &'static str, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::Schema(format!("Failed to encode request body: {e}")))?;
        Ok(Self { method: Method::POST, path, query: Vec::new(), body: Some(body) })
    }

    fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    fn param_opt(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    /// 2xx; carries the raw body.
    Done(String),
    /// Non-retryable failure.
    Fail(AppError),
    /// Retryable failure, with an optional server-provided delay.
    Retry { cause: String, retry_after: Option<Duration> },
}

/// Authenticated client for the DeBank Pro OpenAPI.
#[derive(Clone)]
pub struct DeBankClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl fmt::Debug for DeBankClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeBankClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DeBankClient {
    /// Create a client from the application configuration.
    ///
    /// # Errors
    /// Returns an error if the access key is not a valid header value or the
    /// HTTP client cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        let mut key = HeaderValue::from_str(config.access_key.expose())
            .map_err(|_| AppError::Config("DEBANK_ACCESS_KEY contains invalid characters".into()))?;
        key.set_sensitive(true);

        let name = HeaderName::from_bytes(endpoints::ACCESS_KEY_HEADER.as_bytes())
            .map_err(|e| AppError::Transport(format!("Invalid header name: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(name, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http, base_url: config.base_url.clone(), retry: config.retry.clone() })
    }

    /// Run a request to completion, retrying transient faults.
    async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut backoff = self.retry.backoff();

        loop {
            let attempt = backoff.attempts();
            debug!(
                method = %request.method,
                path = request.path,
                attempt,
                "Sending DeBank request"
            );

            let mut builder = self.http.request(request.method.clone(), &url).query(&request.query);
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let outcome = match builder.send().await {
                Ok(response) => classify(response).await,
                Err(e) if e.is_builder() => {
                    Attempt::Fail(AppError::Transport(format!("Invalid request: {e}")))
                }
                Err(e) if e.is_timeout() => {
                    Attempt::Retry { cause: format!("request timed out: {e}"), retry_after: None }
                }
                Err(e) => {
                    Attempt::Retry { cause: format!("network error: {e}"), retry_after: None }
                }
            };

            match outcome {
                Attempt::Done(body) => return decode(request.path, &body),
                Attempt::Fail(err) => {
                    debug!(path = request.path, attempt, error = %err, "DeBank request failed");
                    return Err(err);
                }
                Attempt::Retry { cause, retry_after } => match backoff.next_delay(retry_after) {
                    Some(delay) => {
                        warn!(
                            path = request.path,
                            attempt,
                            cause = %cause,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying DeBank request"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(AppError::TransientFailure { attempts: attempt, cause }),
                },
            }
        }
    }

    // ========================================================================
    // Chains, protocols, pools
    // ========================================================================

    pub async fn get_chain(&self, chain: &ChainId) -> Result<Chain> {
        self.execute(Request::get(endpoints::CHAIN).param("id", chain)).await
    }

    pub async fn get_chain_list(&self) -> Result<Vec<Chain>> {
        self.execute(Request::get(endpoints::CHAIN_LIST)).await
    }

    pub async fn get_protocol(&self, protocol_id: &str) -> Result<Protocol> {
        self.execute(Request::get(endpoints::PROTOCOL).param("id", protocol_id)).await
    }

    pub async fn get_protocol_list(&self, chain: &ChainId) -> Result<Vec<Protocol>> {
        self.execute(Request::get(endpoints::PROTOCOL_LIST).param("chain_id", chain)).await
    }

    /// Protocols on every chain.
    pub async fn get_all_protocols(&self) -> Result<Vec<Protocol>> {
        self.execute(Request::get(endpoints::PROTOCOL_ALL_LIST)).await
    }

    pub async fn get_pool(&self, pool_id: &str, chain: &ChainId) -> Result<Pool> {
        let request = Request::get(endpoints::POOL).param("id", pool_id).param("chain_id", chain);
        self.execute(request).await
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub async fn get_token(&self, chain: &ChainId, token_id: &str) -> Result<Token> {
        let request = Request::get(endpoints::TOKEN).param("chain_id", chain).param("id", token_id);
        self.execute(request).await
    }

    pub async fn get_tokens_by_ids(
        &self,
        chain: &ChainId,
        token_ids: &[String],
    ) -> Result<Vec<Token>> {
        let request = Request::get(endpoints::TOKEN_LIST_BY_IDS)
            .param("chain_id", chain)
            .param("ids", token_ids.join(","));
        self.execute(request).await
    }

    /// Price of a token on `date` (`YYYY-MM-DD`).
    pub async fn get_token_history_price(
        &self,
        chain: &ChainId,
        token_id: &str,
        date: &str,
    ) -> Result<TokenHistoricalPrice> {
        let request = Request::get(endpoints::TOKEN_HISTORY_PRICE)
            .param("chain_id", chain)
            .param("id", token_id)
            .param("date_at", date);
        self.execute(request).await
    }

    pub async fn get_token_top_holders(
        &self,
        chain: &ChainId,
        token_id: &str,
        start: u64,
        limit: u32,
    ) -> Result<Vec<TokenHolder>> {
        let request = Request::get(endpoints::TOKEN_TOP_HOLDERS)
            .param("chain_id", chain)
            .param("id", token_id)
            .param("start", start)
            .param("limit", limit);
        self.execute(request).await
    }

    // ========================================================================
    // User balances and holdings
    // ========================================================================

    pub async fn get_user_total_balance(&self, user: &EvmAddress) -> Result<TotalBalance> {
        self.execute(Request::get(endpoints::USER_TOTAL_BALANCE).param("id", user)).await
    }

    pub async fn get_user_chain_balance(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<ChainUsdValue> {
        let request =
            Request::get(endpoints::USER_CHAIN_BALANCE).param("id", user).param("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_token(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
        token_id: &str,
    ) -> Result<Token> {
        let request = Request::get(endpoints::USER_TOKEN)
            .param("id", user)
            .param("chain_id", chain)
            .param("token_id", token_id);
        self.execute(request).await
    }

    pub async fn get_user_token_list(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
        is_all: bool,
    ) -> Result<Vec<Token>> {
        let request = Request::get(endpoints::USER_TOKEN_LIST)
            .param("id", user)
            .param("chain_id", chain)
            .param("is_all", is_all);
        self.execute(request).await
    }

    pub async fn get_user_all_token_list(
        &self,
        user: &EvmAddress,
        is_all: bool,
    ) -> Result<Vec<Token>> {
        let request =
            Request::get(endpoints::USER_ALL_TOKEN_LIST).param("id", user).param("is_all", is_all);
        self.execute(request).await
    }

    pub async fn get_user_nft_list(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
        is_all: bool,
    ) -> Result<Vec<Nft>> {
        let request = Request::get(endpoints::USER_NFT_LIST)
            .param("id", user)
            .param("chain_id", chain)
            .param("is_all", is_all);
        self.execute(request).await
    }

    pub async fn get_user_all_nft_list(&self, user: &EvmAddress, is_all: bool) -> Result<Vec<Nft>> {
        let request =
            Request::get(endpoints::USER_ALL_NFT_LIST).param("id", user).param("is_all", is_all);
        self.execute(request).await
    }

    // ========================================================================
    // User protocol positions
    // ========================================================================

    pub async fn get_user_protocol(
        &self,
        user: &EvmAddress,
        protocol_id: &str,
        chain: Option<&ChainId>,
    ) -> Result<ComplexProtocolPosition> {
        let request = Request::get(endpoints::USER_PROTOCOL)
            .param("id", user)
            .param("protocol_id", protocol_id)
            .param_opt("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_simple_protocol_list(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<Vec<SimpleProtocolPosition>> {
        let request = Request::get(endpoints::USER_SIMPLE_PROTOCOL_LIST)
            .param("id", user)
            .param("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_all_simple_protocol_list(
        &self,
        user: &EvmAddress,
    ) -> Result<Vec<SimpleProtocolPosition>> {
        self.execute(Request::get(endpoints::USER_ALL_SIMPLE_PROTOCOL_LIST).param("id", user)).await
    }

    pub async fn get_user_complex_protocol_list(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<Vec<ComplexProtocolPosition>> {
        let request = Request::get(endpoints::USER_COMPLEX_PROTOCOL_LIST)
            .param("id", user)
            .param("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_all_complex_protocol_list(
        &self,
        user: &EvmAddress,
    ) -> Result<Vec<ComplexProtocolPosition>> {
        let request = Request::get(endpoints::USER_ALL_COMPLEX_PROTOCOL_LIST).param("id", user);
        self.execute(request).await
    }

    // ========================================================================
    // User activity
    // ========================================================================

    pub async fn get_user_history_list(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
        filters: &HistoryFilters,
    ) -> Result<HistoryPage> {
        let request =
            history_request(endpoints::USER_HISTORY_LIST, user, filters).param("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_all_history_list(
        &self,
        user: &EvmAddress,
        filters: &HistoryFilters,
    ) -> Result<HistoryPage> {
        self.execute(history_request(endpoints::USER_ALL_HISTORY_LIST, user, filters)).await
    }

    pub async fn get_user_token_approvals(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<Vec<TokenApproval>> {
        let request = Request::get(endpoints::USER_TOKEN_AUTHORIZED_LIST)
            .param("id", user)
            .param("chain_id", chain);
        self.execute(request).await
    }

    pub async fn get_user_nft_approvals(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<NftApprovals> {
        let request = Request::get(endpoints::USER_NFT_AUTHORIZED_LIST)
            .param("id", user)
            .param("chain_id", chain);
        self.execute(request).await
    }

    /// 24h net worth curve across chains, optionally limited to `chain_ids`.
    pub async fn get_user_total_net_curve(
        &self,
        user: &EvmAddress,
        chain_ids: &[ChainId],
    ) -> Result<Vec<NetCurvePoint>> {
        let request = Request::get(endpoints::USER_TOTAL_NET_CURVE)
            .param("id", user)
            .param_opt("chain_ids", join_ids(chain_ids));
        self.execute(request).await
    }

    pub async fn get_user_chain_net_curve(
        &self,
        user: &EvmAddress,
        chain: &ChainId,
    ) -> Result<Vec<NetCurvePoint>> {
        let request = Request::get(endpoints::USER_CHAIN_NET_CURVE)
            .param("id", user)
            .param("chain_id", chain);
        self.execute(request).await
    }

    // ========================================================================
    // Wallet and account
    // ========================================================================

    pub async fn get_gas_market(&self, chain: &ChainId) -> Result<Vec<GasTier>> {
        self.execute(Request::get(endpoints::WALLET_GAS_MARKET).param("chain_id", chain)).await
    }

    /// Pre-execute a transaction (after any pending ones).
    pub async fn pre_exec_tx(&self, request: &PreExecRequest) -> Result<PreExecResult> {
        self.execute(Request::post(endpoints::WALLET_PRE_EXEC_TX, request)?).await
    }

    /// Explain a transaction without simulating balance changes.
    pub async fn explain_tx(&self, request: &PreExecRequest) -> Result<TxExplanation> {
        self.execute(Request::post(endpoints::WALLET_EXPLAIN_TX, request)?).await
    }

    pub async fn get_account_units(&self) -> Result<AccountUnits> {
        self.execute(Request::get(endpoints::ACCOUNT_UNITS)).await
    }
}

fn history_request(path: &'static str, user: &EvmAddress, filters: &HistoryFilters) -> Request {
    Request::get(path)
        .param("id", user)
        .param("page_count", filters.page_count)
        .param_opt("token_id", filters.token_id.as_deref())
        .param_opt("start_time", filters.start_time)
}

fn join_ids(ids: &[ChainId]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    Some(ids.iter().map(ChainId::as_str).collect::<Vec<_>>().join(","))
}

/// Sort a response into success, terminal failure or retryable failure.
async fn classify(response: Response) -> Attempt {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Attempt::Retry {
                cause: format!("failed to read response body: {e}"),
                retry_after: None,
            }
        }
    };

    if status.is_success() {
        return Attempt::Done(body);
    }

    let message = extract_error_message(&body, status);
    match status {
        StatusCode::UNAUTHORIZED => Attempt::Fail(AppError::Authentication),
        StatusCode::FORBIDDEN => Attempt::Fail(AppError::Authorization(message)),
        StatusCode::TOO_MANY_REQUESTS => {
            Attempt::Retry { cause: format!("rate limited (HTTP 429): {message}"), retry_after }
        }
        s if s.is_server_error() => {
            Attempt::Retry { cause: format!("HTTP {}: {message}", s.as_u16()), retry_after }
        }
        s => Attempt::Fail(AppError::BadRequest { status: s.as_u16(), message }),
    }
}

/// Error message from `error.message`, then `message`, then the raw body.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status.canonical_reason().unwrap_or("empty response body").to_string()
    } else {
        body.to_string()
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| AppError::Schema(format!("{path}: {e}")))
}
