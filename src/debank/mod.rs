//! DeBank Pro API access.
//!
//! The client, its retry policy, endpoint paths and static chain tables.

pub mod chains;
pub mod client;
pub mod endpoints;
pub mod retry;

pub use client::DeBankClient;
pub use retry::RetryPolicy;
