#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use tower::ServiceExt;

use todo_api::app;
use todo_api::config::Config;
use todo_api::services::auth::build_auth_service;
use todo_api::services::id_codec::IdCodec;
use todo_api::services::store::MemoryStore;
use todo_api::state::AppState;

pub const SECRET: &str = "integration-test-secret";

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The full router (auth, guards, HTTP layers) over an in-memory store.
pub fn app() -> Result<Router> {
    let config = Config::from_lookup(|key| match key {
        "AUTH_JWT_ALGORITHM" => Some("HS256".to_string()),
        "AUTH_JWT_SECRET" => Some(SECRET.to_string()),
        _ => None,
    })?;

    let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)?;
    let store = Arc::new(MemoryStore::new(id_codec));
    let auth = build_auth_service(&config.auth)?;

    Ok(app::build_router(AppState::new(store, auth), &config))
}

pub fn token_with(claims: Value, secret: &str) -> Result<String> {
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn token_for(sub: &str) -> Result<String> {
    let exp = chrono::Utc::now().timestamp() + 3600;
    token_with(json!({"sub": sub, "exp": exp}), SECRET)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<Reply> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => req.body(Body::empty())?,
    };

    send_request(app, req).await
}

pub async fn send_request(app: &Router, req: Request<Body>) -> Result<Reply> {
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let headers = res.headers().clone();

    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).context("response body is not JSON")?
    };

    Ok(Reply {
        status,
        headers,
        body,
    })
}

/// Creates a record as `token`'s subject and returns its `_id`.
pub async fn create(app: &Router, collection: &str, token: &str, body: Value) -> Result<String> {
    let reply = send(
        app,
        Method::POST,
        &format!("/{}", collection),
        Some(token),
        Some(body),
    )
    .await?;
    anyhow::ensure!(
        reply.status == StatusCode::CREATED,
        "create failed: {} {}",
        reply.status,
        reply.body
    );

    reply.body["_id"]
        .as_str()
        .map(str::to_string)
        .context("created record has no _id")
}
