/// gRPC server module for identity-service
///
/// Exports:
/// - IdentityServiceServer: AuthService implementation
/// - campus: Generated protobuf types from identity_service.proto
/// - correlation_interceptor: stamps every request with a correlation id
pub mod server;

pub use server::{campus, correlation_interceptor, IdentityServiceServer};
