//! API Gateway library
//! Re-exports modules for the binary and integration tests

pub mod authz;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod rest_api;
pub mod state;

pub use error::{ErrorResponse, GatewayError};
pub use state::GatewayState;
