use std::sync::Arc;

use tracing::{info, warn};

use crate::commerce::cart::CartManager;
use crate::commerce::locks::CartLocks;
use crate::domain::cart::{CartId, CartState};
use crate::domain::order::{CheckoutPlan, Order};
use crate::domain::user::Identity;
use crate::errors::{ApplicationError, DomainError};
use crate::store::{CartStore, CheckoutStore};

/// Converts a cart into an order while holding the cart's lock.
#[derive(Clone)]
pub struct CheckoutEngine {
    cart_manager: CartManager,
    carts: Arc<dyn CartStore>,
    checkout: Arc<dyn CheckoutStore>,
    locks: CartLocks,
}

impl CheckoutEngine {
    pub fn new(
        cart_manager: CartManager,
        carts: Arc<dyn CartStore>,
        checkout: Arc<dyn CheckoutStore>,
        locks: CartLocks,
    ) -> Self {
        Self { cart_manager, carts, checkout, locks }
    }

    /// Checks out `cart_id`, or the caller's own cart when none is given.
    ///
    /// Foreign carts fail with `Forbidden` and carts without lines with `EmptyCart`.
    pub async fn checkout(
        &self,
        identity: &Identity,
        cart_id: Option<CartId>,
    ) -> Result<Order, ApplicationError> {
        let cart_id = match cart_id {
            Some(cart_id) => cart_id,
            None => self.carts.get_or_create_cart(identity.user_id).await?,
        };

        self.cart_manager.owned_cart(identity, cart_id).await?;
        let _guard = self.locks.acquire(cart_id).await;

        // Re-read under the lock so the plan matches what is committed.
        let cart = self.cart_manager.owned_cart(identity, cart_id).await?;
        if cart.state() == CartState::Empty {
            return Err(DomainError::EmptyCart { cart_id }.into());
        }

        let plan = CheckoutPlan { user_id: identity.user_id, cart_id, lines: cart.lines };
        let order = self.checkout.commit_checkout(&plan).await.map_err(|error| {
            warn!(
                event_name = "commerce.checkout.failed",
                user_id = %identity.user_id,
                cart_id = %cart_id,
                error = %error,
                "checkout was rolled back"
            );
            ApplicationError::from(error)
        })?;

        if order.item_ids() != plan.item_ids() {
            return Err(DomainError::InvariantViolation(format!(
                "order {} holds {} of {} planned lines from cart {cart_id}",
                order.id,
                order.lines.len(),
                plan.lines.len()
            ))
            .into());
        }

        info!(
            event_name = "commerce.checkout.completed",
            user_id = %identity.user_id,
            cart_id = %cart_id,
            order_id = %order.id,
            line_count = order.lines.len(),
            "checkout completed"
        );
        Ok(order)
    }
}
