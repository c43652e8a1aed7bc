//! Key-addressed document store used by the org chart API.
//!
//! The store is deliberately small: point reads, collection scans, equality
//! filters, full-document writes and deletes. Two backends ship here, an
//! in-process [`MemoryStore`] and a sea-orm backed [`SqlStore`].

mod memory;
mod sql;

use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::{Alphanumeric, DistString};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

pub use memory::MemoryStore;
pub use sql::SqlStore;

/// Length of identifiers produced by [`generate_id`].
pub const GENERATED_ID_LEN: usize = 20;

/// Field map of a stored document.
pub type Fields = Map<String, Value>;

/// Shared, dynamically dispatched store handle.
pub type SharedStore = Arc<dyn DocumentStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A document as returned by the store: its key plus its JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize the body into a typed record. The document key is written
    /// into the `id` field before decoding and wins over any stored value.
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Serialize a record into a document body.
pub fn encode<T: Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::Unsupported("documents must encode to JSON objects")),
    }
}

/// Random identifier in the shape of a Firestore auto-id.
pub fn generate_id() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), GENERATED_ID_LEN)
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Point lookups for several ids. Missing ids are omitted from the result.
    async fn get_many(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Document>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.get(collection, id).await? {
                found.push(doc);
            }
        }
        Ok(found)
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Documents whose `field` is JSON-equal to `value`.
    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    fn new_id(&self) -> String {
        generate_id()
    }

    /// Create or fully replace the document at `id`.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;

    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<String> {
        let id = self.new_id();
        self.set(collection, &id, fields).await?;
        Ok(id)
    }

    /// Idempotent: deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Which backend to open, usually derived from `DATABASE_URL`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreSettings {
    Memory,
    Sql { url: String },
}

impl StoreSettings {
    pub fn from_env() -> Self {
        Self::from_url(std::env::var("DATABASE_URL").ok())
    }

    pub fn from_url(url: Option<String>) -> Self {
        match url.map(|raw| raw.trim().to_string()) {
            Some(url) if !url.is_empty() && url != "memory:" => Self::Sql { url },
            _ => Self::Memory,
        }
    }

    pub async fn open(&self) -> StoreResult<StoreHandle> {
        match self {
            Self::Memory => {
                info!("using in-memory document store");
                Ok(StoreHandle::Memory(Arc::new(MemoryStore::new())))
            }
            Self::Sql { url } => {
                let store = SqlStore::connect(url).await?;
                info!(backend = ?store.connection().get_database_backend(), "connected SQL document store");
                Ok(StoreHandle::Sql(Arc::new(store)))
            }
        }
    }
}

/// An opened store. The SQL variant also exposes its connection so callers
/// can run migrations against it.
#[derive(Clone)]
pub enum StoreHandle {
    Memory(Arc<MemoryStore>),
    Sql(Arc<SqlStore>),
}

impl StoreHandle {
    pub fn shared(&self) -> SharedStore {
        match self {
            Self::Memory(store) => store.clone(),
            Self::Sql(store) => store.clone(),
        }
    }

    pub fn connection(&self) -> Option<&DatabaseConnection> {
        match self {
            Self::Memory(_) => None,
            Self::Sql(store) => Some(store.connection()),
        }
    }
}
