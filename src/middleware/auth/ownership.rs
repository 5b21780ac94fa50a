//! Ownership guards: only a record's creator may list, read, or change it.
//!
//! - `collection_guard` (`/{collection}`): stamps the caller's subject into `creatorID` of the
//!   create payload (POST) or of the list filter (GET). Client-supplied values are overwritten.
//! - `resource_guard` (`/{collection}/{id}`): loads the record and lets the request through only
//!   when its `creatorID` is the caller. The confirmed owner travels on as `VerifiedOwner`, and
//!   the handlers make their writes conditional on it.
//!
//! Both answer 401 when the request carries no subject claim.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Request, State},
    http::{Method, Uri, header, uri::PathAndQuery},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::error::Error as StdError;
use url::form_urlencoded;

use crate::api::extractors::{AuthSubject, VerifiedOwner};
use crate::error::AppError;
use crate::schema::{Collection, OWNER_FIELD};
use crate::services::store::client::owned_by;
use crate::state::AppState;

pub async fn collection_guard(
    AuthSubject(subject): AuthSubject,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let req = match *req.method() {
        Method::POST => stamp_body(req, &subject).await?,
        Method::GET => {
            let (mut parts, body) = req.into_parts();
            parts.uri = stamp_query(&parts.uri, &subject)?;
            Request::from_parts(parts, body)
        }
        _ => req,
    };

    Ok(next.run(req).await)
}

pub async fn resource_guard<C: Collection>(
    State(state): State<AppState>,
    AuthSubject(subject): AuthSubject,
    Path(id): Path<String>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(record) = state.store.get(C::NAME, &id).await? else {
        return Err(AppError::not_found(C::NAME));
    };

    if !owned_by(&record, &subject) {
        tracing::warn!(
            collection = C::NAME,
            id = %id,
            sub = %subject,
            "ownership check failed"
        );
        return Err(AppError::Forbidden);
    }

    req.extensions_mut().insert(VerifiedOwner(subject));

    Ok(next.run(req).await)
}

async fn stamp_body(req: Request, subject: &str) -> Result<Request, AppError> {
    let (mut parts, body) = req.into_parts();

    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| {
            if exceeds_body_limit(&e) {
                AppError::payload_too_large()
            } else {
                AppError::bad_request("INVALID_BODY", "failed to read request body")
            }
        })?;

    let mut payload: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AppError::bad_request("INVALID_JSON", e.to_string()))?;

    let Value::Object(fields) = &mut payload else {
        return Err(AppError::bad_request(
            "INVALID_BODY",
            "expected a JSON object",
        ));
    };
    fields.insert(OWNER_FIELD.to_string(), Value::String(subject.to_string()));

    let bytes = Bytes::from(serde_json::to_vec(&payload).map_err(|_| AppError::Internal)?);

    // the body length changed
    parts.headers.remove(header::CONTENT_LENGTH);

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

// RequestBodyLimitLayer reports an oversized streamed body through the error's source chain
fn exceeds_body_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Rewrites the query string so `creatorID` appears exactly once, set to `subject`.
fn stamp_query(uri: &Uri, subject: &str) -> Result<Uri, AppError> {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(raw) = uri.query() {
        query.extend_pairs(
            form_urlencoded::parse(raw.as_bytes()).filter(|(name, _)| name != OWNER_FIELD),
        );
    }
    query.append_pair(OWNER_FIELD, subject);

    let path_and_query = format!("{}?{}", uri.path(), query.finish());

    let mut parts = uri.clone().into_parts();
    parts.path_and_query =
        Some(PathAndQuery::try_from(path_and_query).map_err(|_| AppError::Internal)?);

    Uri::from_parts(parts).map_err(|_| AppError::Internal)
}
