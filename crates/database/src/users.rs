// database/users.rs - models and queries for the users collection

pub mod model;
pub mod query;

pub use model::{UserFilter, UserModel, UserUpdate};
pub use query::{UserStore, UsersRepository};

pub const USERS_COLLECTION: &str = "users";
