/// Service layer for identity-service
pub mod token_issuer;

pub use token_issuer::{LoginOutcome, TokenIssuer};
