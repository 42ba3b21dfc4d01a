//! Tool handler services.
//!
//! Each tier wraps the DeBank client: core data, wallet portfolio and
//! advanced analytics.

pub mod advanced;
pub mod core;
pub mod portfolio;

pub use self::core::{CoreService, ProtocolQuery, TokenInfoQuery};
pub use advanced::{AdvancedService, NetCurveQuery};
pub use portfolio::{PortfolioService, UserProtocolsQuery, UserTokensQuery};
