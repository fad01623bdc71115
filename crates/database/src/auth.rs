// database/auth.rs - models and queries for per-device refresh tokens

pub mod model;
pub mod query;

pub use model::RefreshTokenModel;
pub use query::{RefreshTokenRepository, RefreshTokenStore};

pub const REFRESH_TOKENS_COLLECTION: &str = "refresh-tokens";
