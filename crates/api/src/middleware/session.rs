//! Session-owner extractors.
//!
//! There is no authentication: each browser session generates an opaque
//! token and sends it as `X-Session-ID`. The token is only ever compared
//! against a row's `locked_by`; it is never generated or stored here.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use stockroom_core::locking::validate_owner_id;

use crate::error::AppError;

/// Header carrying the caller's session token.
pub const SESSION_HEADER: &str = "x-session-id";

/// The owner token of the current request. Rejects with a validation error
/// when the header is missing or blank.
///
/// ```ignore
/// async fn my_handler(owner: SessionOwner) -> AppResult<Json<()>> {
///     tracing::info!(owner_id = %owner.owner_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionOwner {
    pub owner_id: String,
}

impl SessionOwner {
    fn from_parts(parts: &Parts) -> Result<Option<Self>, AppError> {
        let Some(raw) = parts.headers.get(SESSION_HEADER) else {
            return Ok(None);
        };
        let raw = raw
            .to_str()
            .map_err(|_| AppError::validation("X-Session-ID must be visible ASCII"))?;
        let owner_id = validate_owner_id(raw).map_err(AppError::validation)?;
        Ok(Some(SessionOwner {
            owner_id: owner_id.to_string(),
        }))
    }
}

impl<S> FromRequestParts<S> for SessionOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)?
            .ok_or_else(|| AppError::validation("X-Session-ID header is required"))
    }
}

/// `Option<SessionOwner>`: absent header yields `None`, a malformed one is
/// still rejected.
impl<S> OptionalFromRequestParts<S> for SessionOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Self::from_parts(parts)
    }
}
