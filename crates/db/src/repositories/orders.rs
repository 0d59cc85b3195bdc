use chrono::Utc;
use sqlx::{Row, SqliteConnection};

use cartwheel_core::domain::item::ItemId;
use cartwheel_core::domain::order::{Order, OrderId, OrderLine, OrderLineId};
use cartwheel_core::domain::user::UserId;
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::OrderStore;

use super::{decode, parse_timestamp, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, user_id: UserId, items: &[ItemId]) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order = insert_order(&mut tx, user_id, items).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn select_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query("SELECT id, user_id, created_at FROM orders WHERE user_id = ? ORDER BY id")
            .bind(user_id.0)
            .fetch_all(&mut *conn)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            orders.push(hydrate_order(&mut conn, row).await?);
        }
        Ok(orders)
    }

    async fn select_by_id(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, user_id, created_at FROM orders WHERE id = ?")
            .bind(order_id.0)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(hydrate_order(&mut conn, row).await?)),
            None => Ok(None),
        }
    }
}

/// Writes an order and its lines on `conn`; the caller owns the transaction.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    user_id: UserId,
    items: &[ItemId],
) -> Result<Order, RepositoryError> {
    let now = Utc::now();
    let order_id = OrderId(
        sqlx::query("INSERT INTO orders (user_id, created_at) VALUES (?, ?)")
            .bind(user_id.0)
            .bind(now.to_rfc3339())
            .execute(&mut *conn)
            .await?
            .last_insert_rowid(),
    );

    let mut lines = Vec::with_capacity(items.len());
    for item_id in items {
        let line_id = sqlx::query(
            "INSERT INTO order_items (order_id, item_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(order_id.0)
        .bind(item_id.0)
        .bind(now.to_rfc3339())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        lines.push(OrderLine {
            id: OrderLineId(line_id),
            order_id,
            item_id: *item_id,
            created_at: now,
        });
    }

    Ok(Order { id: order_id, user_id, lines, created_at: now })
}

async fn hydrate_order(
    conn: &mut SqliteConnection,
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Order, RepositoryError> {
    let id = OrderId(row.try_get("id").map_err(decode)?);
    let user_id = UserId(row.try_get("user_id").map_err(decode)?);
    let created_at: String = row.try_get("created_at").map_err(decode)?;

    let rows = sqlx::query(
        "SELECT id, order_id, item_id, created_at FROM order_items WHERE order_id = ? ORDER BY id",
    )
    .bind(id.0)
    .fetch_all(&mut *conn)
    .await?;

    let lines = rows
        .iter()
        .map(|row| -> Result<OrderLine, RepositoryError> {
            let line_created_at: String = row.try_get("created_at").map_err(decode)?;
            Ok(OrderLine {
                id: OrderLineId(row.try_get("id").map_err(decode)?),
                order_id: OrderId(row.try_get("order_id").map_err(decode)?),
                item_id: ItemId(row.try_get("item_id").map_err(decode)?),
                created_at: parse_timestamp(&line_created_at)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order { id, user_id, lines, created_at: parse_timestamp(&created_at)? })
}

#[async_trait::async_trait]
impl OrderStore for SqlOrderRepository {
    async fn record_order(&self, user_id: UserId, items: &[ItemId]) -> Result<Order, StoreError> {
        Ok(self.insert(user_id, items).await?)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        Ok(self.select_for_user(user_id).await?)
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.select_by_id(order_id).await?)
    }
}
