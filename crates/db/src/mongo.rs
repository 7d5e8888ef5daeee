//! MongoDB document store.
//!
//! The document `id` is stored as Mongo's `_id` and mapped back on read.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bson::{doc, Bson};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database, IndexModel};

use crate::{
    document_id, new_id, CollectionSpec, Document, DocumentStore, StoreError, StoreResult,
    ID_FIELD,
};

const MONGO_ID: &str = "_id";

pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .with_context(|| "failed to parse MongoDB connection string")?;
        options.app_name = Some("tripdesk".to_string());
        options.connect_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(options).with_context(|| "failed to build MongoDB client")?;
        tracing::info!(target: "tripdesk-db", database, "connected to MongoDB");

        Ok(Self {
            database: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<bson::Document> {
        self.database.collection::<bson::Document>(name)
    }
}

fn to_bson_document(id: &str, doc: &Document) -> StoreResult<bson::Document> {
    let mut bson_doc = bson::to_document(doc)?;
    bson_doc.remove(ID_FIELD);
    bson_doc.insert(MONGO_ID, id);
    Ok(bson_doc)
}

fn from_bson_document(mut bson_doc: bson::Document) -> StoreResult<Document> {
    let id = bson_doc.remove(MONGO_ID);
    let value = Bson::Document(bson_doc).into_relaxed_extjson();
    let mut doc = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(StoreError::InvalidDocument(format!(
                "expected object, found {other}"
            )))
        }
    };

    let id = match id {
        Some(Bson::String(id)) => id,
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => other.to_string(),
        None => return Err(StoreError::InvalidDocument("document without _id".to_string())),
    };
    doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id));
    Ok(doc)
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> StoreResult<()> {
        let collection = self.collection(spec.name);
        for field in spec.indexes {
            let model = IndexModel::builder().keys(doc! { *field: 1 }).build();
            collection.create_index(model, None).await?;
        }
        tracing::debug!(
            target: "tripdesk-db",
            collection = spec.name,
            indexes = spec.indexes.len(),
            "collection ensured"
        );
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).find(None, None).await?;
        let rows: Vec<bson::Document> = cursor.try_collect().await?;
        rows.into_iter().map(from_bson_document).collect()
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let found = self
            .collection(collection)
            .find_one(doc! { MONGO_ID: id }, None)
            .await?;
        match found {
            Some(row) => from_bson_document(row),
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        let id = match document_id(&doc) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_id(),
        };
        doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id.clone()));

        let row = to_bson_document(&id, &doc)?;
        self.collection(collection).insert_one(row, None).await?;
        Ok(doc)
    }

    async fn replace(&self, collection: &str, id: &str, mut doc: Document) -> StoreResult<Document> {
        doc.insert(ID_FIELD.to_string(), serde_json::Value::String(id.to_string()));

        let row = to_bson_document(id, &doc)?;
        let result = self
            .collection(collection)
            .replace_one(doc! { MONGO_ID: id }, row, None)
            .await?;
        if result.matched_count == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let result = self
            .collection(collection)
            .delete_one(doc! { MONGO_ID: id }, None)
            .await?;
        if result.deleted_count == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &serde_json::Value,
    ) -> StoreResult<Vec<Document>> {
        let key = if field == ID_FIELD { MONGO_ID } else { field };
        let filter = doc! { key: bson::to_bson(value)? };
        let cursor = self.collection(collection).find(filter, None).await?;
        let rows: Vec<bson::Document> = cursor.try_collect().await?;
        rows.into_iter().map(from_bson_document).collect()
    }

    async fn count(&self, collection: &str) -> StoreResult<u64> {
        Ok(self
            .collection(collection)
            .count_documents(None, None)
            .await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_moves_between_id_and_mongo_id() {
        let doc = json!({"id": "lead-1", "name": "Ravi", "travelers": 3})
            .as_object()
            .cloned()
            .unwrap();

        let row = to_bson_document("lead-1", &doc).unwrap();
        assert_eq!(row.get_str("_id").unwrap(), "lead-1");
        assert!(row.get("id").is_none());

        let back = from_bson_document(row).unwrap();
        assert_eq!(back["id"], "lead-1");
        assert_eq!(back["name"], "Ravi");
        assert_eq!(back["travelers"], 3);
    }
}
