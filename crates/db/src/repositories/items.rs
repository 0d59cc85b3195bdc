use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use cartwheel_core::domain::item::{Item, ItemId, NewItem};
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::CatalogStore;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlItemRepository {
    pool: DbPool,
}

impl SqlItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, item: &NewItem) -> Result<Item, RepositoryError> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO items (name, price, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.name)
        .bind(item.price.to_string())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Item { id: ItemId(id), name: item.name.clone(), price: item.price, created_at: now })
    }

    async fn select_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name, price, created_at FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn select_by_id(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, price, created_at FROM items WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let price: String = row.try_get("price").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;

    let price = Decimal::from_str(&price)
        .map_err(|error| RepositoryError::Decode(format!("invalid price `{price}`: {error}")))?;

    Ok(Item { id: ItemId(id), name, price, created_at: parse_timestamp(&created_at)? })
}

#[async_trait::async_trait]
impl CatalogStore for SqlItemRepository {
    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError> {
        Ok(self.insert(item).await?)
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.select_all().await?)
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.select_by_id(id).await?)
    }
}
