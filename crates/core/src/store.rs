//! Persistence seams for the commerce services.
//!
//! Backends live in `cartwheel-db`; services only ever see these traits behind `Arc<dyn ...>`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::cart::{Cart, CartId, CartLine};
use crate::domain::item::{Item, ItemId, NewItem};
use crate::domain::order::{CheckoutPlan, Order, OrderId};
use crate::domain::user::{Credentials, Identity, SessionToken, User, UserId};
use crate::errors::StoreError;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the username is already taken.
    async fn create_user(&self, credentials: &Credentials) -> Result<User, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_credentials(&self, credentials: &Credentials)
        -> Result<Option<User>, StoreError>;
    /// Replaces any previous token held by the user.
    async fn assign_token(&self, user_id: UserId, token: &SessionToken) -> Result<(), StoreError>;
    async fn resolve_token(&self, token: &str) -> Result<Option<Identity>, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError>;
    async fn list_items(&self) -> Result<Vec<Item>, StoreError>;
    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the single cart of `user_id`, creating it atomically when absent.
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<CartId, StoreError>;
    async fn find_cart(&self, cart_id: CartId) -> Result<Option<Cart>, StoreError>;
    async fn carts_for_user(&self, user_id: UserId) -> Result<Vec<Cart>, StoreError>;
    async fn append_line(&self, cart_id: CartId, item_id: ItemId) -> Result<CartLine, StoreError>;
    async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError>;
    async fn clear_lines(&self, cart_id: CartId) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn record_order(&self, user_id: UserId, items: &[ItemId]) -> Result<Order, StoreError>;
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;
    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;
}

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Creates the order and removes exactly the planned cart lines as one unit.
    ///
    /// Returns `StoreError::Conflict` without side effects when any planned line is gone.
    async fn commit_checkout(&self, plan: &CheckoutPlan) -> Result<Order, StoreError>;
}

#[derive(Clone)]
pub struct Stores {
    pub identity: Arc<dyn IdentityStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub checkout: Arc<dyn CheckoutStore>,
}
