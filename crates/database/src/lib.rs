// database/lib.rs - persistence layer for users, verification codes and refresh tokens

use mongodb::bson::Document;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use std::time::Duration;

pub mod auth;
pub mod codes;
pub mod error;
pub mod hash;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod repository;
pub mod users;

pub use error::DatabaseError;
pub use hash::{HashError, HashService};
pub use repository::{EntityRepository, Page, Paginate};

// Lets MongoDB remove documents once `key` is older than `duration_in_secs`
pub async fn set_ttl_index<T>(
    collection: &Collection<T>,
    key: &str,
    duration_in_secs: u64,
) -> Result<(), DatabaseError> {
    let options = IndexOptions::builder()
        .expire_after(Duration::from_secs(duration_in_secs))
        .build();

    let mut keys = Document::new();
    keys.insert(key, 1);

    let model = IndexModel::builder().keys(keys).options(options).build();

    collection.create_index(model, None).await?;
    Ok(())
}

// Unique index over one or more keys
pub async fn set_unique_index<T>(
    collection: &Collection<T>,
    keys: Document,
) -> Result<(), DatabaseError> {
    let options = IndexOptions::builder().unique(true).build();

    let model = IndexModel::builder().keys(keys).options(options).build();

    collection.create_index(model, None).await?;
    Ok(())
}

// Creates every index the api relies on
pub async fn create_indexes(client: &mongodb::Client, database: &str) -> Result<(), DatabaseError> {
    let db = client.database(database);

    users::model::create_user_index(&db).await?;
    codes::model::create_code_index(&db).await?;
    auth::model::create_refresh_token_index(&db).await?;

    tracing::debug!(database, "Indexes ensured");
    Ok(())
}

