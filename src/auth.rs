//! Authentication lives in a separate gateway; by the time a request
//! reaches this service the gateway has verified the session and stamped
//! the user id onto the `x-user-id` header. This extractor only reads it.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use uuid::Uuid;

pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "missing x-user-id header"))?;
        let user_id = Uuid::parse_str(raw)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid x-user-id header"))?;
        Ok(AuthUser(user_id))
    }
}
