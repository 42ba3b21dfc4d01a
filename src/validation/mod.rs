//! Input validation module.
//!
//! Pure, synchronous checks that turn raw tool arguments into normalized
//! values before any request is issued.

use std::{collections::BTreeSet, fmt, str::FromStr};

use alloy::primitives::Address;
use chrono::NaiveDate;

use crate::{
    debank::chains::DEFAULT_SUPPORTED_CHAINS,
    error::{AppError, Result},
};

/// Default page size when the caller gives none.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page size accepted.
pub const MAX_LIMIT: u32 = 500;

/// Largest number of ids in a batch token lookup.
pub const MAX_TOKEN_IDS: usize = 100;

// ============================================================================
// Validated Values
// ============================================================================

/// An EVM address in canonical lowercase `0x` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvmAddress(String);

impl EvmAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A DeBank chain identifier (e.g. "eth", "bsc").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainId(String);

impl ChainId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounded page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Page size, within `[1, MAX_LIMIT]`.
    pub limit: u32,
    /// Items to skip.
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT, offset: 0 }
    }
}

impl Pagination {
    /// Lower the page-size ceiling for endpoints with a tighter upstream limit.
    pub fn with_max_limit(self, max: u32) -> Self {
        Self { limit: self.limit.min(max.max(1)), ..self }
    }

    /// Slice bounds of this page within a collection of `len` items.
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(len);
        let end = start.saturating_add(self.limit as usize).min(len);
        start..end
    }
}

/// Chain identifiers the validators accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainAllowList {
    /// Any well-formed identifier.
    Any,
    /// Only the listed identifiers.
    Only(BTreeSet<String>),
}

impl Default for ChainAllowList {
    fn default() -> Self {
        Self::Only(DEFAULT_SUPPORTED_CHAINS.iter().map(|c| c.to_string()).collect())
    }
}

impl ChainAllowList {
    /// Parse a comma-separated list; `*` accepts any chain.
    pub fn parse(list: &str) -> Self {
        let list = list.trim();
        if list == "*" {
            return Self::Any;
        }
        Self::from_ids(list.split(',').map(str::trim).filter(|c| !c.is_empty()))
    }

    /// Build from chain identifiers, e.g. those returned by the chain list endpoint.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(ids.into_iter().map(|c| c.as_ref().to_lowercase()).collect())
    }

    pub fn contains(&self, chain: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(chains) => chains.contains(chain),
        }
    }
}

// ============================================================================
// Validators
// ============================================================================

/// Validate a wallet address.
pub fn validate_address(raw: &str) -> Result<EvmAddress> {
    parse_evm_address("address", raw)
}

/// Validate an EVM address held in `field`, normalizing it to lowercase.
pub fn parse_evm_address(field: &str, raw: &str) -> Result<EvmAddress> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation(field, "cannot be empty"));
    }

    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(AppError::validation(field, format!("must start with '0x': {raw}")));
    }

    // 0x + 40 hex chars = 42 total
    if trimmed.len() != 42 {
        return Err(AppError::validation(
            field,
            format!("must be 42 characters (0x + 40 hex chars), got {}: {raw}", trimmed.len()),
        ));
    }

    let address = Address::from_str(trimmed)
        .map_err(|e| AppError::validation(field, format!("invalid address '{raw}': {e}")))?;

    Ok(EvmAddress(format!("0x{}", alloy::primitives::hex::encode(address.as_slice()))))
}

/// Validate a chain identifier against the allow-list.
pub fn validate_chain_id(raw: &str, allowed: &ChainAllowList) -> Result<ChainId> {
    validate_chain_field("chain_id", raw, allowed)
}

/// Validate an optional chain identifier.
pub fn validate_optional_chain_id(
    raw: Option<&str>,
    allowed: &ChainAllowList,
) -> Result<Option<ChainId>> {
    raw.map(str::trim).filter(|c| !c.is_empty()).map(|c| validate_chain_id(c, allowed)).transpose()
}

/// Validate a comma-separated list of chain identifiers.
pub fn validate_chain_ids(raw: &str, allowed: &ChainAllowList) -> Result<Vec<ChainId>> {
    let chains = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| validate_chain_field("chain_ids", c, allowed))
        .collect::<Result<Vec<_>>>()?;

    if chains.is_empty() {
        return Err(AppError::validation("chain_ids", "must list at least one chain"));
    }
    Ok(chains)
}

fn validate_chain_field(field: &str, raw: &str, allowed: &ChainAllowList) -> Result<ChainId> {
    let chain = raw.trim().to_lowercase();

    if chain.is_empty() {
        return Err(AppError::validation(field, "cannot be empty"));
    }

    if !chain.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::validation(field, format!("malformed chain identifier '{raw}'")));
    }

    if !allowed.contains(&chain) {
        return Err(AppError::validation(field, format!("chain '{chain}' is not supported")));
    }

    Ok(ChainId(chain))
}

/// Validate pagination, defaulting and clamping `limit` and rejecting a negative `offset`.
pub fn validate_pagination(limit: Option<i64>, offset: Option<i64>) -> Result<Pagination> {
    let limit = limit
        .map(|l| l.clamp(1, i64::from(MAX_LIMIT)) as u32)
        .unwrap_or(DEFAULT_LIMIT);

    let offset = match offset {
        None => 0,
        Some(o) if o < 0 => {
            return Err(AppError::validation("offset", format!("must be >= 0, got {o}")));
        }
        Some(o) => o as u64,
    };

    Ok(Pagination { limit, offset })
}

/// Validate a token identifier: a contract address or a native token id like "eth".
pub fn validate_token_id(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return parse_evm_address(field, trimmed).map(|a| a.0);
    }

    if trimmed.is_empty() {
        return Err(AppError::validation(field, "cannot be empty"));
    }

    if trimmed.len() > 64
        || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AppError::validation(field, format!("malformed token id '{raw}'")));
    }

    Ok(trimmed.to_lowercase())
}

/// Validate a batch of token identifiers.
pub fn validate_token_ids(raw: &[String]) -> Result<Vec<String>> {
    if raw.is_empty() {
        return Err(AppError::validation("token_ids", "list cannot be empty"));
    }

    if raw.len() > MAX_TOKEN_IDS {
        return Err(AppError::validation(
            "token_ids",
            format!("at most {MAX_TOKEN_IDS} ids allowed, got {}", raw.len()),
        ));
    }

    raw.iter()
        .enumerate()
        .map(|(i, id)| validate_token_id(&format!("token_ids[{i}]"), id))
        .collect()
}

/// Validate a protocol identifier (e.g. "uniswap3", "bsc_pancakeswap").
pub fn validate_protocol_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation("protocol_id", "cannot be empty"));
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(AppError::validation("protocol_id", "cannot contain whitespace"));
    }

    Ok(trimmed.to_string())
}

/// Validate a pool identifier (`0x`-prefixed hex).
pub fn validate_pool_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();

    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AppError::validation("pool_id", format!("must start with '0x': {raw}")))?;

    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::validation("pool_id", format!("must be hexadecimal: {raw}")));
    }

    Ok(trimmed.to_lowercase())
}

/// Validate a `YYYY-MM-DD` date.
pub fn validate_date(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| {
            AppError::validation("date", format!("expected YYYY-MM-DD, got '{raw}': {e}"))
        })
}

/// Validate an optional Unix timestamp.
pub fn validate_start_time(raw: Option<i64>) -> Result<Option<u64>> {
    match raw {
        Some(t) if t < 0 => {
            Err(AppError::validation("start_time", "must be a non-negative Unix timestamp"))
        }
        Some(t) => Ok(Some(t as u64)),
        None => Ok(None),
    }
}

/// Validate hex calldata (`0x` or `0x` followed by hex digits).
pub fn validate_calldata(field: &str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .ok_or_else(|| AppError::validation(field, "must start with '0x'"))?;

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::validation(field, "must be hexadecimal"));
    }

    Ok(trimmed.to_lowercase())
}
