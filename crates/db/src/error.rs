use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match err.kind.as_ref() {
            // E11000 is MongoDB's duplicate key error.
            ErrorKind::Write(_) if err.to_string().contains("E11000") => {
                StoreError::Conflict(format!("duplicate key: {err}"))
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::InvalidDocument(format!("bson serialization: {err}"))
    }
}
