mod auth;

pub use auth::{ClientTokens, require_bearer};
