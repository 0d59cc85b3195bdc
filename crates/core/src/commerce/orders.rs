use std::sync::Arc;

use crate::domain::order::{Order, OrderId};
use crate::domain::user::Identity;
use crate::errors::ApplicationError;
use crate::store::OrderStore;

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Orders owned by the caller, each with its lines.
    pub async fn list_orders(&self, identity: &Identity) -> Result<Vec<Order>, ApplicationError> {
        Ok(self.store.orders_for_user(identity.user_id).await?)
    }

    pub async fn order(
        &self,
        identity: &Identity,
        order_id: OrderId,
    ) -> Result<Order, ApplicationError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("order {order_id}")))?;

        if order.user_id != identity.user_id {
            return Err(ApplicationError::forbidden(format!("order {order_id}")));
        }
        Ok(order)
    }
}
