use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use cartwheel_core::domain::cart::{Cart, CartId, CartLine, CartLineId};
use cartwheel_core::domain::item::ItemId;
use cartwheel_core::domain::user::UserId;
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::CartStore;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlCartRepository {
    pool: DbPool,
}

impl SqlCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Relies on the unique `carts.user_id` constraint, so concurrent callers converge on one row.
    async fn upsert_for_user(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO carts (user_id, created_at, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.0)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_one(&self.pool)
            .await?;
        Ok(CartId(id))
    }

    async fn select_cart(&self, cart_id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, user_id, created_at FROM carts WHERE id = ?")
            .bind(cart_id.0)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(hydrate_cart(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn select_for_user(&self, user_id: UserId) -> Result<Vec<Cart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query("SELECT id, user_id, created_at FROM carts WHERE user_id = ? ORDER BY id")
            .bind(user_id.0)
            .fetch_all(&mut *conn)
            .await?;

        let mut carts = Vec::with_capacity(rows.len());
        for row in &rows {
            carts.push(hydrate_cart(&mut conn, row).await?);
        }
        Ok(carts)
    }

    async fn insert_line(
        &self,
        cart_id: CartId,
        item_id: ItemId,
    ) -> Result<CartLine, RepositoryError> {
        let now = Utc::now();
        let id = sqlx::query("INSERT INTO cart_items (cart_id, item_id, created_at) VALUES (?, ?, ?)")
            .bind(cart_id.0)
            .bind(item_id.0)
            .bind(now.to_rfc3339())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(CartLine { id: CartLineId(id), cart_id, item_id, created_at: now })
    }

    async fn select_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_lines(&mut conn, cart_id).await
    }

    async fn delete_lines(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let deleted = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(cart_id.0)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected())
    }
}

async fn hydrate_cart(
    conn: &mut SqliteConnection,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Cart, RepositoryError> {
    let id = CartId(row.try_get("id").map_err(decode)?);
    let user_id = UserId(row.try_get("user_id").map_err(decode)?);
    let created_at: String = row.try_get("created_at").map_err(decode)?;

    Ok(Cart {
        id,
        user_id,
        lines: load_lines(conn, id).await?,
        created_at: parse_timestamp(&created_at)?,
    })
}

pub(crate) async fn load_lines(
    conn: &mut SqliteConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT id, cart_id, item_id, created_at FROM cart_items WHERE cart_id = ? ORDER BY id",
    )
    .bind(cart_id.0)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| -> Result<CartLine, RepositoryError> {
            let created_at: String = row.try_get("created_at").map_err(decode)?;
            Ok(CartLine {
                id: CartLineId(row.try_get("id").map_err(decode)?),
                cart_id: CartId(row.try_get("cart_id").map_err(decode)?),
                item_id: ItemId(row.try_get("item_id").map_err(decode)?),
                created_at: parse_timestamp(&created_at)?,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl CartStore for SqlCartRepository {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<CartId, StoreError> {
        Ok(self.upsert_for_user(user_id).await?)
    }

    async fn find_cart(&self, cart_id: CartId) -> Result<Option<Cart>, StoreError> {
        Ok(self.select_cart(cart_id).await?)
    }

    async fn carts_for_user(&self, user_id: UserId) -> Result<Vec<Cart>, StoreError> {
        Ok(self.select_for_user(user_id).await?)
    }

    async fn append_line(&self, cart_id: CartId, item_id: ItemId) -> Result<CartLine, StoreError> {
        Ok(self.insert_line(cart_id, item_id).await?)
    }

    async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError> {
        Ok(self.select_lines(cart_id).await?)
    }

    async fn clear_lines(&self, cart_id: CartId) -> Result<u64, StoreError> {
        Ok(self.delete_lines(cart_id).await?)
    }
}
