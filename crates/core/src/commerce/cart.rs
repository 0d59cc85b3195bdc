use std::sync::Arc;

use tracing::info;

use crate::commerce::locks::CartLocks;
use crate::domain::cart::{Cart, CartId, CartLine};
use crate::domain::item::ItemId;
use crate::domain::user::Identity;
use crate::errors::ApplicationError;
use crate::store::{CartStore, CatalogStore};

#[derive(Clone)]
pub struct CartManager {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    locks: CartLocks,
}

impl CartManager {
    pub fn new(carts: Arc<dyn CartStore>, catalog: Arc<dyn CatalogStore>, locks: CartLocks) -> Self {
        Self { carts, catalog, locks }
    }

    pub async fn get_or_create_cart(&self, identity: &Identity) -> Result<CartId, ApplicationError> {
        Ok(self.carts.get_or_create_cart(identity.user_id).await?)
    }

    pub async fn add_line(
        &self,
        identity: &Identity,
        item_id: ItemId,
    ) -> Result<CartLine, ApplicationError> {
        if self.catalog.find_item(item_id).await?.is_none() {
            return Err(ApplicationError::not_found(format!("item {item_id}")));
        }

        let cart_id = self.carts.get_or_create_cart(identity.user_id).await?;
        let _guard = self.locks.acquire(cart_id).await;
        let line = self.carts.append_line(cart_id, item_id).await?;

        info!(
            event_name = "commerce.cart.line_added",
            user_id = %identity.user_id,
            cart_id = %cart_id,
            item_id = %item_id,
            line_id = %line.id,
            "cart line added"
        );
        Ok(line)
    }

    pub async fn lines(
        &self,
        identity: &Identity,
        cart_id: CartId,
    ) -> Result<Vec<CartLine>, ApplicationError> {
        self.owned_cart(identity, cart_id).await?;
        Ok(self.carts.lines(cart_id).await?)
    }

    /// Removes every line; the cart itself is kept for the next add.
    pub async fn clear_lines(
        &self,
        identity: &Identity,
        cart_id: CartId,
    ) -> Result<u64, ApplicationError> {
        self.owned_cart(identity, cart_id).await?;
        let _guard = self.locks.acquire(cart_id).await;
        let removed = self.carts.clear_lines(cart_id).await?;

        info!(
            event_name = "commerce.cart.cleared",
            user_id = %identity.user_id,
            cart_id = %cart_id,
            removed,
            "cart lines cleared"
        );
        Ok(removed)
    }

    pub async fn carts(&self, identity: &Identity) -> Result<Vec<Cart>, ApplicationError> {
        Ok(self.carts.carts_for_user(identity.user_id).await?)
    }

    pub(crate) async fn owned_cart(
        &self,
        identity: &Identity,
        cart_id: CartId,
    ) -> Result<Cart, ApplicationError> {
        let cart = self
            .carts
            .find_cart(cart_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found(format!("cart {cart_id}")))?;

        if !cart.is_owned_by(identity.user_id) {
            return Err(ApplicationError::forbidden(format!("cart {cart_id}")));
        }
        Ok(cart)
    }
}
