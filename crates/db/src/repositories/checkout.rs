use cartwheel_core::domain::order::{CheckoutPlan, Order};
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::CheckoutStore;
use tracing::debug;

use super::orders::insert_order;
use super::RepositoryError;
use crate::DbPool;

pub struct SqlCheckoutRepository {
    pool: DbPool,
}

impl SqlCheckoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Order insert and line removal share one transaction. Dropping `tx` on any
    /// early return rolls everything back.
    async fn convert(&self, plan: &CheckoutPlan) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = insert_order(&mut tx, plan.user_id, &plan.item_ids()).await?;

        let mut removed = 0;
        for line_id in plan.line_ids() {
            removed += sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
                .bind(line_id.0)
                .bind(plan.cart_id.0)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        if removed != plan.lines.len() as u64 {
            return Err(RepositoryError::Conflict(format!(
                "cart {} changed during checkout ({removed} of {} lines still present)",
                plan.cart_id,
                plan.lines.len()
            )));
        }

        tx.commit().await?;
        debug!(
            event_name = "db.checkout.committed",
            cart_id = %plan.cart_id,
            order_id = %order.id,
            lines = plan.lines.len(),
            "cart lines moved into order"
        );
        Ok(order)
    }
}

#[async_trait::async_trait]
impl CheckoutStore for SqlCheckoutRepository {
    async fn commit_checkout(&self, plan: &CheckoutPlan) -> Result<Order, StoreError> {
        Ok(self.convert(plan).await?)
    }
}
