use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::sync::{Mutex, RwLock};

use cartwheel_core::domain::cart::{Cart, CartId, CartLine, CartLineId};
use cartwheel_core::domain::item::{Item, ItemId, NewItem};
use cartwheel_core::domain::order::{CheckoutPlan, Order, OrderId, OrderLine, OrderLineId};
use cartwheel_core::domain::user::{Credentials, Identity, SessionToken, User, UserId};
use cartwheel_core::errors::StoreError;
use cartwheel_core::store::{CartStore, CatalogStore, CheckoutStore, IdentityStore, OrderStore};

struct StoredUser {
    user: User,
    password: String,
    token: Option<String>,
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    users: BTreeMap<UserId, StoredUser>,
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: RwLock<UserTable>,
}

#[async_trait::async_trait]
impl IdentityStore for InMemoryUserRepository {
    async fn create_user(&self, credentials: &Credentials) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        if table.users.values().any(|stored| stored.user.username == credentials.username) {
            return Err(StoreError::Conflict(format!(
                "username `{}` already exists",
                credentials.username
            )));
        }

        table.next_id += 1;
        let user = User {
            id: UserId(table.next_id),
            username: credentials.username.clone(),
            created_at: Utc::now(),
        };
        table.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password: credentials.password.expose_secret().to_string(),
                token: None,
            },
        );
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table.users.values().map(|stored| stored.user.clone()).collect())
    }

    async fn find_by_credentials(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .users
            .values()
            .find(|stored| {
                stored.user.username == credentials.username
                    && stored.password == credentials.password.expose_secret()
            })
            .map(|stored| stored.user.clone()))
    }

    async fn assign_token(&self, user_id: UserId, token: &SessionToken) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        let stored = table
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::Decode(format!("user {user_id} not found")))?;
        stored.token = Some(token.expose().to_string());
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<Identity>, StoreError> {
        if token.is_empty() {
            return Ok(None);
        }

        let table = self.table.read().await;
        Ok(table
            .users
            .values()
            .find(|stored| stored.token.as_deref() == Some(token))
            .map(|stored| Identity::from(stored.user.clone())))
    }
}

#[derive(Default)]
struct ItemTable {
    next_id: i64,
    items: BTreeMap<ItemId, Item>,
}

#[derive(Default)]
pub struct InMemoryItemRepository {
    table: RwLock<ItemTable>,
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryItemRepository {
    async fn create_item(&self, item: &NewItem) -> Result<Item, StoreError> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let created = Item {
            id: ItemId(table.next_id),
            name: item.name.clone(),
            price: item.price,
            created_at: Utc::now(),
        };
        table.items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_items(&self) -> Result<Vec<Item>, StoreError> {
        Ok(self.table.read().await.items.values().cloned().collect())
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.table.read().await.items.get(&id).cloned())
    }
}

#[derive(Default)]
struct CartDirectory {
    next_cart_id: i64,
    carts: BTreeMap<CartId, Arc<Mutex<Cart>>>,
    cart_by_user: HashMap<UserId, CartId>,
}

#[derive(Default)]
struct OrderBook {
    next_order_id: i64,
    next_order_line_id: i64,
    orders: BTreeMap<OrderId, Order>,
}

impl OrderBook {
    fn record(&mut self, user_id: UserId, items: &[ItemId]) -> Order {
        let now = Utc::now();
        self.next_order_id += 1;
        let order_id = OrderId(self.next_order_id);

        let mut lines = Vec::with_capacity(items.len());
        for item_id in items {
            self.next_order_line_id += 1;
            lines.push(OrderLine {
                id: OrderLineId(self.next_order_line_id),
                order_id,
                item_id: *item_id,
                created_at: now,
            });
        }

        let order = Order { id: order_id, user_id, lines, created_at: now };
        self.orders.insert(order_id, order.clone());
        order
    }
}

/// Each cart sits behind its own mutex; the directory lock is held only to find or
/// create a cart. Checkout locks the cart, then the order book, and no path takes them
/// in the other order.
#[derive(Default)]
pub struct InMemoryCommerceRepository {
    directory: RwLock<CartDirectory>,
    next_line_id: AtomicI64,
    orders: RwLock<OrderBook>,
}

impl InMemoryCommerceRepository {
    async fn cart(&self, cart_id: CartId) -> Option<Arc<Mutex<Cart>>> {
        self.directory.read().await.carts.get(&cart_id).cloned()
    }

    async fn existing_cart(&self, cart_id: CartId) -> Result<Arc<Mutex<Cart>>, StoreError> {
        self.cart(cart_id)
            .await
            .ok_or_else(|| StoreError::Backend(format!("cart {cart_id} does not exist")))
    }
}

#[async_trait::async_trait]
impl CartStore for InMemoryCommerceRepository {
    async fn get_or_create_cart(&self, user_id: UserId) -> Result<CartId, StoreError> {
        let mut directory = self.directory.write().await;
        if let Some(cart_id) = directory.cart_by_user.get(&user_id) {
            return Ok(*cart_id);
        }

        directory.next_cart_id += 1;
        let cart_id = CartId(directory.next_cart_id);
        let cart = Cart { id: cart_id, user_id, lines: Vec::new(), created_at: Utc::now() };
        directory.carts.insert(cart_id, Arc::new(Mutex::new(cart)));
        directory.cart_by_user.insert(user_id, cart_id);
        Ok(cart_id)
    }

    async fn find_cart(&self, cart_id: CartId) -> Result<Option<Cart>, StoreError> {
        let Some(cart) = self.cart(cart_id).await else {
            return Ok(None);
        };
        let snapshot = cart.lock().await.clone();
        Ok(Some(snapshot))
    }

    async fn carts_for_user(&self, user_id: UserId) -> Result<Vec<Cart>, StoreError> {
        let cart = {
            let directory = self.directory.read().await;
            directory.cart_by_user.get(&user_id).and_then(|id| directory.carts.get(id)).cloned()
        };
        let Some(cart) = cart else {
            return Ok(Vec::new());
        };
        let snapshot = cart.lock().await.clone();
        Ok(vec![snapshot])
    }

    async fn append_line(&self, cart_id: CartId, item_id: ItemId) -> Result<CartLine, StoreError> {
        let cart = self.existing_cart(cart_id).await?;
        let mut cart = cart.lock().await;
        let line = CartLine {
            id: CartLineId(self.next_line_id.fetch_add(1, Ordering::SeqCst) + 1),
            cart_id,
            item_id,
            created_at: Utc::now(),
        };
        cart.lines.push(line.clone());
        Ok(line)
    }

    async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, StoreError> {
        let Some(cart) = self.cart(cart_id).await else {
            return Ok(Vec::new());
        };
        let lines = cart.lock().await.lines.clone();
        Ok(lines)
    }

    async fn clear_lines(&self, cart_id: CartId) -> Result<u64, StoreError> {
        let cart = self.existing_cart(cart_id).await?;
        let mut cart = cart.lock().await;
        let removed = cart.lines.len() as u64;
        cart.lines.clear();
        Ok(removed)
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryCommerceRepository {
    async fn record_order(&self, user_id: UserId, items: &[ItemId]) -> Result<Order, StoreError> {
        Ok(self.orders.write().await.record(user_id, items))
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let book = self.orders.read().await;
        Ok(book.orders.values().filter(|order| order.user_id == user_id).cloned().collect())
    }

    async fn find_order(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.orders.get(&order_id).cloned())
    }
}

#[async_trait::async_trait]
impl CheckoutStore for InMemoryCommerceRepository {
    async fn commit_checkout(&self, plan: &CheckoutPlan) -> Result<Order, StoreError> {
        let cart = self.existing_cart(plan.cart_id).await?;
        let mut cart = cart.lock().await;

        let planned = plan.line_ids();
        let present = cart.lines.iter().filter(|line| planned.contains(&line.id)).count();
        if present != planned.len() {
            return Err(StoreError::Conflict(format!(
                "cart {} changed during checkout ({present} of {} lines still present)",
                plan.cart_id,
                planned.len()
            )));
        }

        let order = self.orders.write().await.record(plan.user_id, &plan.item_ids());
        cart.lines.retain(|line| !planned.contains(&line.id));
        Ok(order)
    }
}
