//! Typed access to a collection.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Document, DocumentStore, StoreError, StoreResult};

/// A record type persisted in its own collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<T>> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn get(&self, id: &str) -> StoreResult<T> {
        from_document(self.store.get(T::COLLECTION, id).await?)
    }

    /// Insert a record; the store assigns an id when the record has none.
    pub async fn create(&self, record: T) -> StoreResult<T> {
        let stored = self.store.insert(T::COLLECTION, to_document(&record)?).await?;
        from_document(stored)
    }

    /// Overwrite the stored record with the same id.
    pub async fn save(&self, record: &T) -> StoreResult<T> {
        let stored = self
            .store
            .replace(T::COLLECTION, record.id(), to_document(record)?)
            .await?;
        from_document(stored)
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn find_by<V: Serialize>(&self, field: &str, value: V) -> StoreResult<Vec<T>> {
        let value = serde_json::to_value(value)?;
        self.store
            .find_by_field(T::COLLECTION, field, &value)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn count(&self) -> StoreResult<u64> {
        self.store.count(T::COLLECTION).await
    }
}

pub fn to_document<T: Serialize>(record: &T) -> StoreResult<Document> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "records must serialize to objects, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::Object(doc))?)
}
