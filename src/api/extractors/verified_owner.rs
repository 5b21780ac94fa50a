/*
 * Responsibility
 * - resource guard が確認済みの owner を handler に渡す
 * - guard を通っていない request では 401 (route_layer の付け忘れ)
 */
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

/// Owner of the addressed record, confirmed equal to the caller by the resource guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedOwner(pub String);

impl<S> FromRequestParts<S> for VerifiedOwner
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedOwner>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
