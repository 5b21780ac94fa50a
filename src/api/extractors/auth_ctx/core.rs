use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::AuthCtx;

/// The caller's subject claim.
///
/// Reads the `AuthCtx` the access middleware put into request extensions. Missing context or a
/// token without a subject is rejected with 401 (no token sent, or middleware not applied).
#[derive(Debug, Clone)]
pub struct AuthSubject(pub String);

impl<S> FromRequestParts<S> for AuthSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .and_then(AuthCtx::subject)
            .map(|sub| AuthSubject(sub.to_string()))
            .ok_or(AppError::Unauthorized)
    }
}
