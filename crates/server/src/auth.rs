use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use cartwheel_core::domain::user::Identity;

use crate::api::AppState;
use crate::errors::ApiError;

/// Caller identity resolved from the raw token in the `Authorization` header.
///
/// Rejects with 401 before any body is read or any cart/order state is touched.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok());
        let identity = state.shop.identity.authenticate(token).await?;
        Ok(Self(identity))
    }
}
