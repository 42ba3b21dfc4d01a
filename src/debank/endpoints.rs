//! DeBank Pro OpenAPI endpoint paths.

/// Production base URL.
pub const DEFAULT_BASE_URL: &str = "https://pro-openapi.debank.com";

/// Header carrying the access key.
pub const ACCESS_KEY_HEADER: &str = "AccessKey";

// Chains
pub const CHAIN: &str = "/v1/chain";
pub const CHAIN_LIST: &str = "/v1/chain/list";

// Protocols
pub const PROTOCOL: &str = "/v1/protocol";
pub const PROTOCOL_LIST: &str = "/v1/protocol/list";
pub const PROTOCOL_ALL_LIST: &str = "/v1/protocol/all_list";
pub const POOL: &str = "/v1/pool";

// Tokens
pub const TOKEN: &str = "/v1/token";
pub const TOKEN_LIST_BY_IDS: &str = "/v1/token/list_by_ids";
pub const TOKEN_HISTORY_PRICE: &str = "/v1/token/history_price";
pub const TOKEN_TOP_HOLDERS: &str = "/v1/token/top_holders";

// User balances and holdings
pub const USER_TOTAL_BALANCE: &str = "/v1/user/total_balance";
pub const USER_CHAIN_BALANCE: &str = "/v1/user/chain_balance";
pub const USER_TOKEN: &str = "/v1/user/token";
pub const USER_TOKEN_LIST: &str = "/v1/user/token_list";
pub const USER_ALL_TOKEN_LIST: &str = "/v1/user/all_token_list";
pub const USER_NFT_LIST: &str = "/v1/user/nft_list";
pub const USER_ALL_NFT_LIST: &str = "/v1/user/all_nft_list";

// User protocol positions
pub const USER_PROTOCOL: &str = "/v1/user/protocol";
pub const USER_SIMPLE_PROTOCOL_LIST: &str = "/v1/user/simple_protocol_list";
pub const USER_ALL_SIMPLE_PROTOCOL_LIST: &str = "/v1/user/all_simple_protocol_list";
pub const USER_COMPLEX_PROTOCOL_LIST: &str = "/v1/user/complex_protocol_list";
pub const USER_ALL_COMPLEX_PROTOCOL_LIST: &str = "/v1/user/all_complex_protocol_list";

// User activity
pub const USER_HISTORY_LIST: &str = "/v1/user/history_list";
pub const USER_ALL_HISTORY_LIST: &str = "/v1/user/all_history_list";
pub const USER_TOKEN_AUTHORIZED_LIST: &str = "/v1/user/token_authorized_list";
pub const USER_NFT_AUTHORIZED_LIST: &str = "/v1/user/nft_authorized_list";
pub const USER_TOTAL_NET_CURVE: &str = "/v1/user/total_net_curve";
pub const USER_CHAIN_NET_CURVE: &str = "/v1/user/chain_net_curve";

// Wallet
pub const WALLET_GAS_MARKET: &str = "/v1/wallet/gas_market";
pub const WALLET_PRE_EXEC_TX: &str = "/v1/wallet/pre_exec_tx";
pub const WALLET_EXPLAIN_TX: &str = "/v1/wallet/explain_tx";

// Account
pub const ACCOUNT_UNITS: &str = "/v1/account/units";
