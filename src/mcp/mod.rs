//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::DeBankServer;
pub use server::{
    GetChainsInput, GetGasPricesInput, GetPoolInfoInput, GetProtocolsInput, GetTokenHoldersInput,
    GetTokenInfoInput, GetUserApprovalsInput, GetUserBalanceInput, GetUserHistoryInput,
    GetUserNetCurveInput, GetUserNftsInput, GetUserProtocolsInput, GetUserTokensInput,
    SimulateTransactionInput,
};
