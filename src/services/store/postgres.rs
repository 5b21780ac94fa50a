use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::repos::{document_repo, error::RepoError};
use crate::schema::{Document, ID_FIELD};
use crate::services::id_codec::IdCodec;
use crate::services::store::client::{DocumentStore, Query, StoreResult};

/// Postgres-backed document store: one `documents` table with a JSONB body per record.
#[derive(Clone, Debug)]
pub struct PgStore {
    db: PgPool,
    id_codec: IdCodec,
}

impl PgStore {
    pub fn new(db: PgPool, id_codec: IdCodec) -> Self {
        Self { db, id_codec }
    }

    /// Connects and applies the embedded migrations.
    pub async fn connect(database_url: &str, id_codec: IdCodec) -> Result<Self, RepoError> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        Ok(Self::new(db, id_codec))
    }

    fn row_to_document(&self, row: document_repo::DocumentRow) -> StoreResult<Document> {
        let mut doc = row.body.0;
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(self.id_codec.encode(row.id)?),
        );
        Ok(doc)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        doc.remove(ID_FIELD);
        let row = document_repo::insert(&self.db, collection, &doc).await?;
        self.row_to_document(row)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(None);
        };

        document_repo::get(&self.db, collection, id)
            .await?
            .map(|row| self.row_to_document(row))
            .transpose()
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let rows = document_repo::find(
            &self.db,
            collection,
            &query.filter,
            &query.sort.field,
            query.sort.descending,
            query.limit.map(|n| n.min(i64::MAX as usize) as i64),
            query.offset.min(i64::MAX as usize) as i64,
        )
        .await?;

        let mut res = Vec::with_capacity(rows.len());
        for row in rows {
            res.push(self.row_to_document(row)?);
        }

        Ok(res)
    }

    async fn replace(
        &self,
        collection: &str,
        id: &str,
        owner: &str,
        mut doc: Document,
    ) -> StoreResult<Option<Document>> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(None);
        };
        doc.remove(ID_FIELD);

        document_repo::replace_owned(&self.db, collection, id, owner, &doc)
            .await?
            .map(|row| self.row_to_document(row))
            .transpose()
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        owner: &str,
        mut changes: Document,
    ) -> StoreResult<Option<Document>> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(None);
        };
        changes.remove(ID_FIELD);

        document_repo::patch_owned(&self.db, collection, id, owner, &changes)
            .await?
            .map(|row| self.row_to_document(row))
            .transpose()
    }

    async fn delete(&self, collection: &str, id: &str, owner: &str) -> StoreResult<bool> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(false);
        };

        Ok(document_repo::delete_owned(&self.db, collection, id, owner).await?)
    }
}
