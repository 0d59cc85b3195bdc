//! Shop HTTP routes.
//!
//! - `POST /users`, `GET /users`, `POST /users/login`
//! - `POST /items`, `GET /items`
//! - `POST /carts`, `GET /carts`                 (token required)
//! - `POST /orders`, `GET /orders`, `GET /orders/{id}` (token required)

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};

use cartwheel_core::domain::cart::CartId;
use cartwheel_core::domain::item::ItemId;
use cartwheel_core::domain::order::OrderId;
use cartwheel_core::Shop;

use crate::auth::Authenticated;
use crate::dto::{
    AddToCartRequest, CartLineResponse, CartResponse, CheckoutRequest, CreateItemRequest,
    CredentialsRequest, ItemResponse, LoginResponse, OrderResponse, UserResponse,
};
use crate::errors::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub shop: Shop,
}

pub fn router(shop: Shop) -> Router {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/login", post(login))
        .route("/items", post(create_item).get(list_items))
        .route("/carts", post(add_to_cart).get(list_carts))
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(get_order))
        .with_state(AppState { shop })
}

async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    let user = state.shop.identity.register(request.into()).await?;
    Ok(Json(user.into()))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.shop.identity.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state.shop.identity.login(request.into()).await?;
    Ok(Json(LoginResponse { token: token.expose().to_string() }))
}

async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let Json(request) = payload?;
    let item = state.shop.catalog.create_item(request.into()).await?;
    Ok(Json(item.into()))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.shop.catalog.list_items().await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    payload: Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<CartLineResponse>, ApiError> {
    let Json(request) = payload?;
    let line = state.shop.carts.add_line(&identity, ItemId(request.item_id)).await?;
    Ok(Json(line.into()))
}

async fn list_carts(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Vec<CartResponse>>, ApiError> {
    let carts = state.shop.carts.carts(&identity).await?;
    Ok(Json(carts.into_iter().map(CartResponse::from).collect()))
}

/// An empty body checks out the caller's own cart.
async fn create_order(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    body: Bytes,
) -> Result<Json<OrderResponse>, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CheckoutRequest::default()
    } else {
        serde_json::from_slice::<CheckoutRequest>(&body)
            .map_err(|error| ApiError::bad_request(format!("invalid checkout body: {error}")))?
    };

    let order = state.shop.checkout.checkout(&identity, request.cart_id.map(CartId)).await?;
    Ok(Json(order.into()))
}

async fn list_orders(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.shop.orders.list_orders(&identity).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

async fn get_order(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    order_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<OrderResponse>, ApiError> {
    let Path(order_id) = order_id?;
    let order = state.shop.orders.order(&identity, OrderId(order_id)).await?;
    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::State,
        http::{header, Method, Request, StatusCode},
        Json, Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use cartwheel_core::Shop;
    use cartwheel_db::in_memory_stores;

    use super::{create_user, list_users, router, AppState};
    use crate::dto::CredentialsRequest;

    fn app() -> Router {
        router(Shop::new(in_memory_stores()))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn login_as(app: &Router, username: &str) -> String {
        let credentials = json!({ "username": username, "password": "pw" });
        let (status, _) = call(app, Method::POST, "/users", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app, Method::POST, "/users/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().expect("token").to_string()
    }

    async fn create_book(app: &Router) -> i64 {
        let (status, body) =
            call(app, Method::POST, "/items", None, Some(json!({ "name": "Book", "price": 9.99 })))
                .await;
        assert_eq!(status, StatusCode::OK);
        body["ID"].as_i64().expect("item id")
    }

    #[tokio::test]
    async fn create_user_handler_hides_password() {
        let state = AppState { shop: Shop::new(in_memory_stores()) };

        let Json(user) = create_user(
            State(state.clone()),
            Ok(Json(CredentialsRequest {
                username: "alice".to_string(),
                password: "hunter2".to_string(),
            })),
        )
        .await
        .expect("user created");
        assert_eq!(user.username, "alice");

        let Json(users) = list_users(State(state)).await.expect("users listed");
        let serialized = serde_json::to_string(&users).expect("serialize");
        assert!(serialized.contains("alice"));
        assert!(!serialized.contains("hunter2"));
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = app();

        for (method, uri) in [
            (Method::GET, "/carts"),
            (Method::POST, "/carts"),
            (Method::GET, "/orders"),
            (Method::POST, "/orders"),
        ] {
            let (status, body) = call(&app, method.clone(), uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(body["error"], "Invalid token");

            let (status, _) = call(&app, method.clone(), uri, Some("bogus"), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} with bogus token");
        }
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_with_legacy_message() {
        let app = app();
        login_as(&app, "alice").await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username/password");
    }

    #[tokio::test]
    async fn browser_checkout_flow_round_trips() {
        let app = app();
        let token = login_as(&app, "alice").await;
        let book = create_book(&app).await;

        for _ in 0..2 {
            let (status, line) =
                call(&app, Method::POST, "/carts", Some(&token), Some(json!({ "itemID": book })))
                    .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(line["ItemID"], json!(book));
        }

        let (status, carts) = call(&app, Method::GET, "/carts", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(carts.as_array().map(Vec::len), Some(1));
        assert_eq!(carts[0]["Items"].as_array().map(Vec::len), Some(2));
        let cart_id = carts[0]["ID"].clone();

        let (status, order) =
            call(&app, Method::POST, "/orders", Some(&token), Some(json!({ "cartID": cart_id })))
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["Items"].as_array().map(Vec::len), Some(2));
        assert!(order["Items"].as_array().into_iter().flatten().all(|line| line["ItemID"] == json!(book)));

        let (_, carts) = call(&app, Method::GET, "/carts", Some(&token), None).await;
        assert_eq!(carts[0]["ID"], cart_id);
        assert_eq!(carts[0]["Items"].as_array().map(Vec::len), Some(0));

        let (status, orders) = call(&app, Method::GET, "/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders.as_array().map(Vec::len), Some(1));

        let uri = format!("/orders/{}", order["ID"]);
        let (status, fetched) = call(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["ID"], order["ID"]);
    }

    #[tokio::test]
    async fn checkout_without_body_uses_the_callers_cart() {
        let app = app();
        let token = login_as(&app, "alice").await;
        let book = create_book(&app).await;
        call(&app, Method::POST, "/carts", Some(&token), Some(json!({ "itemID": book }))).await;

        let (status, order) = call(&app, Method::POST, "/orders", Some(&token), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["Items"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn empty_cart_checkout_is_unprocessable() {
        let app = app();
        let token = login_as(&app, "alice").await;

        let (status, body) =
            call(&app, Method::POST, "/orders", Some(&token), Some(json!({}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().is_some_and(|message| message.contains("no lines")));
    }

    #[tokio::test]
    async fn checking_out_someone_elses_cart_is_forbidden() {
        let app = app();
        let alice = login_as(&app, "alice").await;
        let mallory = login_as(&app, "mallory").await;
        let book = create_book(&app).await;

        let (_, line) =
            call(&app, Method::POST, "/carts", Some(&alice), Some(json!({ "itemID": book }))).await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/orders",
            Some(&mallory),
            Some(json!({ "cartID": line["CartID"] })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (_, carts) = call(&app, Method::GET, "/carts", Some(&alice), None).await;
        assert_eq!(carts[0]["Items"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn other_users_orders_are_not_visible() {
        let app = app();
        let alice = login_as(&app, "alice").await;
        let bob = login_as(&app, "bob").await;
        let book = create_book(&app).await;

        call(&app, Method::POST, "/carts", Some(&alice), Some(json!({ "itemID": book }))).await;
        let (_, order) = call(&app, Method::POST, "/orders", Some(&alice), None).await;

        let (_, bob_orders) = call(&app, Method::GET, "/orders", Some(&bob), None).await;
        assert_eq!(bob_orders.as_array().map(Vec::len), Some(0));

        let uri = format!("/orders/{}", order["ID"]);
        let (status, _) = call(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_requests() {
        let app = app();
        let token = login_as(&app, "alice").await;

        let (status, _) =
            call(&app, Method::POST, "/carts", Some(&token), Some(json!({ "itemID": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            call(&app, Method::POST, "/items", None, Some(json!({ "name": "Book", "price": -1 })))
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/users", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_order_id_gets_a_json_error_body() {
        let app = app();
        let token = login_as(&app, "alice").await;

        let (status, body) = call(&app, Method::GET, "/orders/abc", Some(&token), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|message| message.contains("abc")));
        assert!(body["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn unknown_item_and_duplicate_user_use_their_own_statuses() {
        let app = app();
        let token = login_as(&app, "alice").await;

        let (status, _) =
            call(&app, Method::POST, "/carts", Some(&token), Some(json!({ "itemID": 404 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::POST,
            "/users",
            None,
            Some(json!({ "username": "alice", "password": "again" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
