use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::schema::{Document, ID_FIELD};
use crate::services::id_codec::IdCodec;
use crate::services::store::client::{
    DocumentStore, Query, StoreResult, compare_field, owned_by,
};

type Collections = HashMap<String, BTreeMap<i64, Document>>;

/// Process-local document store.
///
/// Used when no `DATABASE_URL` is configured (development) and by the tests. Contents are lost
/// on restart.
#[derive(Debug)]
pub struct MemoryStore {
    id_codec: IdCodec,
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    collections: Collections,
}

impl MemoryStore {
    pub fn new(id_codec: IdCodec) -> Self {
        Self {
            id_codec,
            inner: RwLock::new(Inner::default()),
        }
    }

    fn with_id(&self, id: i64, mut doc: Document) -> StoreResult<Document> {
        doc.insert(ID_FIELD.to_string(), Value::String(self.id_codec.encode(id)?));
        Ok(doc)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        doc.remove(ID_FIELD);

        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, doc.clone());

        self.with_id(id, doc)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(None);
        };

        let inner = self.inner.read().await;
        match inner.collections.get(collection).and_then(|c| c.get(&id)) {
            Some(doc) => self.with_id(id, doc.clone()).map(Some),
            None => Ok(None),
        }
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Document>> {
        let inner = self.inner.read().await;
        let Some(docs) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&i64, &Document)> =
            docs.iter().filter(|(_, doc)| query.matches(doc)).collect();

        // ties keep insertion order in the requested direction
        hits.sort_by(|(a_id, a), (b_id, b)| {
            let field = &query.sort.field;
            let ord = compare_field(a.get(field), b.get(field)).then(a_id.cmp(b_id));
            if query.sort.descending { ord.reverse() } else { ord }
        });

        hits.into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|(id, doc)| self.with_id(*id, doc.clone()))
            .collect()
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

        let mut inner = self.inner.write().await;
        let Some(stored) = inner
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
            .filter(|stored| owned_by(stored, owner))
        else {
            return Ok(None);
        };

        *stored = doc.clone();
        self.with_id(id, doc).map(Some)
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

        let mut inner = self.inner.write().await;
        let Some(stored) = inner
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
            .filter(|stored| owned_by(stored, owner))
        else {
            return Ok(None);
        };

        stored.extend(changes);
        let merged = stored.clone();
        self.with_id(id, merged).map(Some)
    }

    async fn delete(&self, collection: &str, id: &str, owner: &str) -> StoreResult<bool> {
        let Some(id) = self.id_codec.decode(id) else {
            return Ok(false);
        };

        let mut inner = self.inner.write().await;
        let Some(docs) = inner.collections.get_mut(collection) else {
            return Ok(false);
        };

        if docs.get(&id).is_some_and(|stored| owned_by(stored, owner)) {
            docs.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OWNER_FIELD;
    use crate::services::id_codec::{DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH};
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(IdCodec::new(DEFAULT_MIN_LENGTH, DEFAULT_ALPHABET).unwrap())
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn id_of(doc: &Document) -> &str {
        doc[ID_FIELD].as_str().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_ignores_client_ids() {
        let store = store();
        let a = store
            .insert("todos", doc(json!({"_id": "mine", "content": "a"})))
            .await
            .unwrap();
        let b = store.insert("todos", doc(json!({"content": "b"}))).await.unwrap();

        assert_ne!(id_of(&a), "mine");
        assert_ne!(id_of(&a), id_of(&b));

        let fetched = store.get("todos", id_of(&a)).await.unwrap().unwrap();
        assert_eq!(fetched, a);
        assert!(store.get("categories", id_of(&a)).await.unwrap().is_none());
        assert!(store.get("todos", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_filters_sorts_and_pages() {
        let store = store();
        for (content, created_at, done) in [
            ("old", "2024-01-01T00:00:00.000Z", false),
            ("new", "2024-03-01T00:00:00.000Z", false),
            ("mid", "2024-02-01T00:00:00.000Z", false),
            ("done", "2024-04-01T00:00:00.000Z", true),
        ] {
            store
                .insert(
                    "todos",
                    doc(json!({"content": content, "createdAt": created_at, "isDone": done})),
                )
                .await
                .unwrap();
        }

        let mut query = Query::filtered(doc(json!({"isDone": false})));
        let contents = |docs: Vec<Document>| {
            docs.into_iter()
                .map(|d| d["content"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            contents(store.find("todos", &query).await.unwrap()),
            ["new", "mid", "old"]
        );

        query.sort.descending = false;
        query.offset = 1;
        query.limit = Some(1);
        assert_eq!(contents(store.find("todos", &query).await.unwrap()), ["mid"]);
    }

    #[tokio::test]
    async fn writes_require_the_recorded_owner() {
        let store = store();
        let created = store
            .insert("todos", doc(json!({OWNER_FIELD: "alice", "content": "x"})))
            .await
            .unwrap();
        let id = id_of(&created).to_string();

        let replaced = store
            .replace("todos", &id, "bob", doc(json!({OWNER_FIELD: "bob", "content": "y"})))
            .await
            .unwrap();
        assert!(replaced.is_none());
        assert!(
            store
                .patch("todos", &id, "bob", doc(json!({"content": "y"})))
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete("todos", &id, "bob").await.unwrap());

        let patched = store
            .patch("todos", &id, "alice", doc(json!({"content": "z"})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched["content"], "z");
        assert_eq!(patched[OWNER_FIELD], "alice");

        assert!(store.delete("todos", &id, "alice").await.unwrap());
        assert!(store.get("todos", &id).await.unwrap().is_none());
    }
}
