//! Transport-agnostic commerce services.
//!
//! Every cart and order operation takes the caller's [`Identity`](crate::domain::user::Identity)
//! explicitly; nothing is looked up from ambient request state.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod identity;
pub mod locks;
pub mod orders;

pub use cart::CartManager;
pub use catalog::CatalogService;
pub use checkout::CheckoutEngine;
pub use identity::IdentityService;
pub use locks::{CartLockGuard, CartLocks};
pub use orders::OrderService;

use crate::store::Stores;

/// The full set of services wired over one bundle of stores.
#[derive(Clone)]
pub struct Shop {
    pub identity: IdentityService,
    pub catalog: CatalogService,
    pub carts: CartManager,
    pub checkout: CheckoutEngine,
    pub orders: OrderService,
}

impl Shop {
    pub fn new(stores: Stores) -> Self {
        let locks = CartLocks::new();
        let carts =
            CartManager::new(stores.carts.clone(), stores.catalog.clone(), locks.clone());
        let checkout =
            CheckoutEngine::new(carts.clone(), stores.carts.clone(), stores.checkout, locks);

        Self {
            identity: IdentityService::new(stores.identity),
            catalog: CatalogService::new(stores.catalog),
            carts,
            checkout,
            orders: OrderService::new(stores.orders),
        }
    }
}
