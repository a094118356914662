use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{errors::ValidationError, id::UserId, types::Requester};

use super::error::ApiError;

/// Header carrying the authenticated user's id, set by the identity provider
/// in front of this service.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity taken from [`USER_ID_HEADER`]. A missing or blank header is anonymous.
#[derive(Debug, Clone)]
pub struct Identity(pub Requester);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Identity(Requester::Anonymous));
        };
        let value = value.to_str().map_err(|_| {
            ValidationError::single(USER_ID_HEADER, "validation.header", "header must be visible ASCII")
        })?;
        let value = value.trim();
        if value.is_empty() {
            Ok(Identity(Requester::Anonymous))
        } else {
            Ok(Identity(Requester::User(UserId::from(value))))
        }
    }
}
