//! Document store interface used by the ownership guard and the CRUD handlers.
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::schema::{CREATED_AT_FIELD, Document, OWNER_FIELD};
use crate::services::id_codec::IdCodecError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
///
/// A missing record is not an error: lookups return `Ok(None)` and conditional writes
/// return `Ok(None)`/`Ok(false)`, leaving the HTTP mapping to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("id codec error: {0}")]
    IdCodec(#[from] IdCodecError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Default for Sort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: CREATED_AT_FIELD.to_string(),
            descending: true,
        }
    }
}

/// Equality filter plus paging for `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Document,
    pub sort: Sort,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Query {
    pub fn filtered(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Field-by-field equality. An absent field compares equal to `null`.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filter
            .iter()
            .all(|(k, v)| doc.get(k).unwrap_or(&Value::Null) == v)
    }
}

/// Ordering used when sorting by a document field: missing/null < bool < number < string.
pub fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub fn owned_by(doc: &Document, owner: &str) -> bool {
    doc.get(OWNER_FIELD).and_then(Value::as_str) == Some(owner)
}

/// A JSON document store keyed by collection and public `_id`.
///
/// Documents passed in never carry `_id`; documents returned always do.
/// Writes that name an `owner` only apply while the stored `creatorID` still equals it, so an
/// ownership check and the write that follows cannot be split by a concurrent change.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    // Returns the backend name (for logging/health).
    fn backend_name(&self) -> &'static str;

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>>;

    // Overwrite the whole document. `Ok(None)` if absent or no longer owned by `owner`.
    async fn replace(
        &self,
        collection: &str,
        id: &str,
        owner: &str,
        doc: Document,
    ) -> StoreResult<Option<Document>>;

    // Merge `changes` into the document (top-level keys). Same precondition as `replace`.
    async fn patch(
        &self,
        collection: &str,
        id: &str,
        owner: &str,
        changes: Document,
    ) -> StoreResult<Option<Document>>;

    // Returns `false` if nothing was deleted.
    async fn delete(&self, collection: &str, id: &str, owner: &str) -> StoreResult<bool>;
}
