pub mod commerce;
pub mod config;
pub mod domain;
pub mod errors;
pub mod store;

pub use commerce::{
    CartLocks, CartManager, CatalogService, CheckoutEngine, IdentityService, OrderService, Shop,
};
pub use domain::cart::{Cart, CartId, CartLine, CartLineId, CartState};
pub use domain::item::{Item, ItemId, NewItem};
pub use domain::order::{CheckoutPlan, Order, OrderId, OrderLine, OrderLineId};
pub use domain::user::{Credentials, Identity, SessionToken, User, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError, StoreError};
pub use store::{CartStore, CatalogStore, CheckoutStore, IdentityStore, OrderStore, Stores};
