// database/codes.rs - models and queries for the email verification codes collection

pub mod model;
pub mod query;

pub use model::VerificationCodeModel;
pub use query::{CodeRepository, CodeStore};

pub const CODES_COLLECTION: &str = "codes";
