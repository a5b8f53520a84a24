//! Request guards for the gateway.
//!
//! `Authenticate` must wrap any route that uses `RequireCapability`; it
//! attaches the verified [`AuthContext`] the capability guards read.

pub mod auth;
pub mod capability;

pub use auth::{correlation_id, AuthContext, Authenticate, CORRELATION_HEADER};
pub use capability::RequireCapability;
