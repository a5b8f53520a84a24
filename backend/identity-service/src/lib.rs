/// Identity Service Library
///
/// Credential verification and the access/refresh token lifecycle.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `context`: Typed per-request context (correlation id)
/// - `db`: Credential store (users)
/// - `error`: Error types
/// - `grpc`: gRPC server implementation
/// - `models`: Data models
/// - `security`: Password hashing, refresh tokens and their store
/// - `services`: Token issuer
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod grpc;
pub mod models;
pub mod security;
pub mod services;

// Re-export commonly used types
pub use context::RequestContext;
pub use error::{IdentityError, Result};
pub use grpc::IdentityServiceServer;
pub use services::TokenIssuer;
