//! In-memory document store.
//!
//! Not durable: all state is lost on restart. Collections are `BTreeMap`s keyed
//! by document id; ids are UUID v7 so iteration order follows creation order.
//! Reads share a read lock, writes are serialized behind the write lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    document_id, new_id, CollectionSpec, Document, DocumentStore, StoreError, StoreResult,
    ID_FIELD,
};

type Collection = BTreeMap<String, Document>;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections.entry(spec.name.to_string()).or_default();
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        let id = match document_id(&doc) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                let id = new_id();
                doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id.clone()));
                id
            }
        };

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{collection}/{id} already exists")));
        }
        docs.insert(id, doc.clone());
        Ok(doc)
    }

    async fn replace(&self, collection: &str, id: &str, mut doc: Document) -> StoreResult<Document> {
        doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id.to_string()));

        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        *slot = doc.clone();
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_when_missing() {
        let store = InMemoryStore::new();
        let stored = store
            .insert("leads", doc(json!({"name": "Asha"})))
            .await
            .unwrap();

        let id = document_id(&stored).unwrap().to_string();
        let fetched = store.get("leads", &id).await.unwrap();
        assert_eq!(fetched["name"], "Asha");
    }

    #[tokio::test]
    async fn insert_rejects_taken_id() {
        let store = InMemoryStore::new();
        store.insert("leads", doc(json!({"id": "a"}))).await.unwrap();
        let err = store.insert("leads", doc(json!({"id": "a"}))).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn replace_is_last_write_wins_and_requires_existing() {
        let store = InMemoryStore::new();
        store
            .insert("blogs", doc(json!({"id": "b1", "title": "first"})))
            .await
            .unwrap();
        store
            .replace("blogs", "b1", doc(json!({"title": "second"})))
            .await
            .unwrap();

        let fetched = store.get("blogs", "b1").await.unwrap();
        assert_eq!(fetched["title"], "second");
        assert_eq!(fetched["id"], "b1");

        let missing = store.replace("blogs", "nope", Document::new()).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn find_by_field_and_count() {
        let store = InMemoryStore::new();
        for status in ["new", "new", "contacted"] {
            store
                .insert("leads", doc(json!({"status": status})))
                .await
                .unwrap();
        }

        let fresh = store
            .find_by_field("leads", "status", &json!("new"))
            .await
            .unwrap();
        assert_eq!(fresh.len(), 2);
        assert_eq!(store.count("leads").await.unwrap(), 3);
        assert_eq!(store.count("unknown").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.delete("leads", "ghost").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
