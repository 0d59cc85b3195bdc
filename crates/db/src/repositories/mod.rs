use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use cartwheel_core::errors::StoreError;
use cartwheel_core::store::Stores;

use crate::DbPool;

pub mod carts;
pub mod checkout;
pub mod items;
pub mod memory;
pub mod orders;
pub mod users;

pub use carts::SqlCartRepository;
pub use checkout::SqlCheckoutRepository;
pub use items::SqlItemRepository;
pub use memory::{InMemoryCommerceRepository, InMemoryItemRepository, InMemoryUserRepository};
pub use orders::SqlOrderRepository;
pub use users::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<RepositoryError> for StoreError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Database(error) if is_unique_violation(&error) => {
                StoreError::Conflict(error.to_string())
            }
            RepositoryError::Database(error) => StoreError::Backend(error.to_string()),
            RepositoryError::Decode(message) => StoreError::Decode(message),
            RepositoryError::Conflict(message) => StoreError::Conflict(message),
        }
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error.as_database_error().is_some_and(|database| database.is_unique_violation())
}

/// Store bundle backed by SQLite.
pub fn sql_stores(pool: DbPool) -> Stores {
    Stores {
        identity: Arc::new(SqlUserRepository::new(pool.clone())),
        catalog: Arc::new(SqlItemRepository::new(pool.clone())),
        carts: Arc::new(SqlCartRepository::new(pool.clone())),
        orders: Arc::new(SqlOrderRepository::new(pool.clone())),
        checkout: Arc::new(SqlCheckoutRepository::new(pool)),
    }
}

/// Store bundle kept entirely in process memory.
pub fn in_memory_stores() -> Stores {
    let commerce = Arc::new(InMemoryCommerceRepository::default());
    Stores {
        identity: Arc::new(InMemoryUserRepository::default()),
        catalog: Arc::new(InMemoryItemRepository::default()),
        carts: commerce.clone(),
        orders: commerce.clone(),
        checkout: commerce,
    }
}

pub(crate) fn decode<E: std::fmt::Display>(error: E) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}
