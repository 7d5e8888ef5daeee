//! Document store abstraction for TripDesk.
//!
//! Records are persisted as JSON documents inside named collections and are
//! always read and written wholesale. Two backends exist: an in-memory store
//! for local development and tests, and MongoDB for deployments.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

pub mod error;
pub mod memory;
pub mod mongo;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use repository::{Record, Repository};

/// A stored document: a JSON object whose `id` field is the document key.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the key field every document carries.
pub const ID_FIELD: &str = "id";

/// Collection declaration contributed by a module at bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    /// Fields that get a secondary index on backends that support them.
    pub indexes: &'static [&'static str],
}

impl CollectionSpec {
    pub const fn new(name: &'static str, indexes: &'static [&'static str]) -> Self {
        Self { name, indexes }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Mongo,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Make sure a collection (and its indexes) exists.
    async fn ensure_collection(&self, spec: &CollectionSpec) -> StoreResult<()>;

    /// All documents of a collection, oldest first.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Insert a new document. Fails with `Conflict` when the id is taken.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Replace an existing document wholesale (last write wins).
    async fn replace(&self, collection: &str, id: &str, doc: Document) -> StoreResult<Document>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Documents whose top-level `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> StoreResult<Vec<Document>>;

    async fn count(&self, collection: &str) -> StoreResult<u64>;

    async fn health_check(&self) -> StoreResult<()>;

    fn backend_name(&self) -> &'static str;
}

/// Generate a new time-ordered document id.
pub fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Read the key of a document, if present and a string.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(|value| value.as_str())
}

/// Open the configured backend.
pub async fn connect(
    backend: StoreBackend,
    uri: &str,
    database: &str,
) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match backend {
        StoreBackend::Memory => {
            tracing::warn!(target: "tripdesk-db", "using in-memory store; data is not durable");
            Ok(Arc::new(memory::InMemoryStore::new()))
        }
        StoreBackend::Mongo => {
            let store = mongo::MongoStore::connect(uri, database).await?;
            Ok(Arc::new(store))
        }
    }
}
