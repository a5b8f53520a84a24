/// Credential store access for identity service
pub mod users;

pub use users::{PgUserRepository, UserRepository};
