//! DeBank MCP Server Library
//!
//! A Model Context Protocol server exposing the DeBank Pro API.
//! Provides tools for querying chains, tokens, wallet portfolios and DeFi
//! positions, and for simulating transactions before they are signed.
//!
//! # Features
//!
//! - **Core Data**: chains, protocols, token prices and top holders, wallet balances
//! - **Portfolio**: token and NFT holdings, protocol positions, history, approvals
//! - **Advanced**: net worth curves, pool metrics, transaction simulation, gas prices
//!
//! # Example
//!
//! ```rust,ignore
//! use debank_mcp::{Config, DeBankServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = DeBankServer::new(config)?;
//!     // Run server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod debank;
pub mod error;
pub mod mcp;
pub mod services;
pub mod types;
pub mod validation;

pub use config::{AccessKey, Config};
pub use debank::{DeBankClient, RetryPolicy};
pub use error::{AppError, Result};
pub use mcp::DeBankServer;
