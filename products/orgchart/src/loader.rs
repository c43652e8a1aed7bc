use std::collections::HashMap;

use async_graphql::dataloader::{DataLoader, Loader};
use platform_api::ApiError;
use platform_store::{Document, SharedStore};
use tracing::debug;

/// Key of a point lookup: collection plus document id.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: &'static str,
    pub id: String,
}

impl DocKey {
    pub fn new(collection: &'static str, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

/// Batches point lookups issued while one operation resolves. Keys requested
/// by several fields are fetched once.
pub struct DocumentLoader {
    store: SharedStore,
}

impl DocumentLoader {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// A fresh loader for a single operation. Nothing is shared across
    /// requests.
    pub fn per_request(store: SharedStore) -> DataLoader<Self> {
        DataLoader::new(Self::new(store), tokio::spawn)
    }
}

impl Loader<DocKey> for DocumentLoader {
    type Value = Document;
    type Error = ApiError;

    async fn load(&self, keys: &[DocKey]) -> Result<HashMap<DocKey, Document>, ApiError> {
        let mut by_collection: HashMap<&'static str, Vec<String>> = HashMap::new();
        for key in keys {
            by_collection
                .entry(key.collection)
                .or_default()
                .push(key.id.clone());
        }

        let mut found = HashMap::with_capacity(keys.len());
        for (collection, ids) in by_collection {
            debug!(collection, count = ids.len(), "batched document lookup");
            let docs = self
                .store
                .get_many(collection, &ids)
                .await
                .map_err(|err| ApiError::internal(err.into()))?;
            for doc in docs {
                found.insert(DocKey::new(collection, doc.id.clone()), doc);
            }
        }
        Ok(found)
    }
}
