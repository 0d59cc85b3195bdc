//! JSON shapes served to the browser client.
//!
//! Field names follow the client's existing expectations (`ID`, `CreatedAt`, `Items`, ...).
//! Request bodies accept the client's camelCase as well as PascalCase and snake_case keys.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartwheel_core::domain::cart::{Cart, CartLine};
use cartwheel_core::domain::item::{Item, NewItem};
use cartwheel_core::domain::order::{Order, OrderLine};
use cartwheel_core::domain::user::{Credentials, User};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

impl From<CredentialsRequest> for Credentials {
    fn from(request: CredentialsRequest) -> Self {
        Credentials::new(request.username, request.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Price")]
    pub price: Decimal,
}

impl From<CreateItemRequest> for NewItem {
    fn from(request: CreateItemRequest) -> Self {
        NewItem::new(request.name, request.price)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    #[serde(rename = "itemID", alias = "ItemID", alias = "itemId", alias = "item_id")]
    pub item_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default, rename = "cartID", alias = "CartID", alias = "cartId", alias = "cart_id")]
    pub cart_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self { id: user.id.0, created_at: user.created_at, username: user.username }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self { id: item.id.0, created_at: item.created_at, name: item.name, price: item.price }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CartLineResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "CartID")]
    pub cart_id: i64,
    #[serde(rename = "ItemID")]
    pub item_id: i64,
}

impl From<CartLine> for CartLineResponse {
    fn from(line: CartLine) -> Self {
        Self {
            id: line.id.0,
            created_at: line.created_at,
            cart_id: line.cart_id.0,
            item_id: line.item_id.0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CartResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    pub items: Vec<CartLineResponse>,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id.0,
            created_at: cart.created_at,
            user_id: cart.user_id.0,
            items: cart.lines.into_iter().map(CartLineResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderLineResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "OrderID")]
    pub order_id: i64,
    #[serde(rename = "ItemID")]
    pub item_id: i64,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.id.0,
            created_at: line.created_at,
            order_id: line.order_id.0,
            item_id: line.item_id.0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderResponse {
    #[serde(rename = "ID")]
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "UserID")]
    pub user_id: i64,
    pub items: Vec<OrderLineResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.0,
            created_at: order.created_at,
            user_id: order.user_id.0,
            items: order.lines.into_iter().map(OrderLineResponse::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use cartwheel_core::domain::item::{Item, ItemId};

    use super::{AddToCartRequest, CheckoutRequest, CredentialsRequest, ItemResponse};

    #[test]
    fn item_response_uses_client_field_names_and_numeric_price() {
        let response = ItemResponse::from(Item {
            id: ItemId(1),
            name: "Book".to_string(),
            price: Decimal::new(999, 2),
            created_at: Utc::now(),
        });

        let value = serde_json::to_value(response).expect("serialize");
        assert_eq!(value["ID"], json!(1));
        assert_eq!(value["Name"], json!("Book"));
        assert_eq!(value["Price"], json!(9.99));
        assert!(value.get("CreatedAt").is_some());
    }

    #[test]
    fn add_to_cart_accepts_every_client_spelling() {
        for body in [r#"{"itemID":3}"#, r#"{"ItemID":3}"#, r#"{"item_id":3}"#, r#"{"itemId":3}"#] {
            let request: AddToCartRequest = serde_json::from_str(body).expect(body);
            assert_eq!(request.item_id, 3);
        }
    }

    #[test]
    fn checkout_cart_id_is_optional() {
        let request: CheckoutRequest = serde_json::from_str("{}").expect("empty object");
        assert_eq!(request.cart_id, None);

        let request: CheckoutRequest = serde_json::from_str(r#"{"cartID":5}"#).expect("cartID");
        assert_eq!(request.cart_id, Some(5));
    }

    #[test]
    fn credentials_accept_pascal_case() {
        let request: CredentialsRequest =
            serde_json::from_str(r#"{"Username":"alice","Password":"pw"}"#).expect("pascal");
        assert_eq!(request.username, "alice");
    }
}
