/*
 * Responsibility
 * - collection 共通の CRUD handler (型パラメータ C で collection を選ぶ)
 * - 入力は schema で検証・正規化してから store に渡す
 *
 * 前提:
 * - list / create は collection_guard を通過済み (creatorID が caller の subject)
 * - get / replace / patch / delete は resource_guard を通過済み
 *   書き込みは VerifiedOwner を条件にして store に投げる
 */
use axum::{
    Json,
    extract::{Path, RawQuery, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;

use crate::api::dto::parse_list_query;
use crate::api::extractors::VerifiedOwner;
use crate::error::AppError;
use crate::schema::{Collection, OWNER_FIELD, WriteMode};
use crate::state::AppState;

pub async fn list_records<C: Collection>(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<impl IntoResponse, AppError> {
    let query = parse_list_query(C::SCHEMA, raw.as_deref())?;
    let records = state.store.find(C::NAME, &query).await?;

    Ok(Json(records))
}

pub async fn create_record<C: Collection>(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let doc = C::SCHEMA.validate(payload, WriteMode::Create)?;

    let created = state.store.insert(C::NAME, doc).await?;
    tracing::info!(collection = C::NAME, id = ?created.get("_id"), "record created");

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_record<C: Collection>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .get(C::NAME, &id)
        .await?
        .ok_or(AppError::not_found(C::NAME))?;

    Ok(Json(record))
}

pub async fn replace_record<C: Collection>(
    State(state): State<AppState>,
    VerifiedOwner(owner): VerifiedOwner,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(mut payload) = payload?;

    // the owner never changes hands
    if let Value::Object(fields) = &mut payload {
        fields.insert(OWNER_FIELD.to_string(), Value::String(owner.clone()));
    }
    let doc = C::SCHEMA.validate(payload, WriteMode::Replace)?;

    let replaced = state
        .store
        .replace(C::NAME, &id, &owner, doc)
        .await?
        .ok_or(AppError::not_found(C::NAME))?;

    Ok(Json(replaced))
}

pub async fn patch_record<C: Collection>(
    State(state): State<AppState>,
    VerifiedOwner(owner): VerifiedOwner,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;

    let mut changes = C::SCHEMA.validate(payload, WriteMode::Patch)?;
    changes.remove(OWNER_FIELD);

    let patched = state
        .store
        .patch(C::NAME, &id, &owner, changes)
        .await?
        .ok_or(AppError::not_found(C::NAME))?;

    Ok(Json(patched))
}

pub async fn delete_record<C: Collection>(
    State(state): State<AppState>,
    VerifiedOwner(owner): VerifiedOwner,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete(C::NAME, &id, &owner).await? {
        return Err(AppError::not_found(C::NAME));
    }

    tracing::info!(collection = C::NAME, id = %id, "record deleted");

    Ok(StatusCode::NO_CONTENT)
}
