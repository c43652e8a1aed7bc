//! Typed reads over the document store.

use async_graphql::{Context, ErrorExtensions, dataloader::DataLoader};
use platform_api::internal_error;
use platform_store::{Document, DocumentStore, SharedStore, StoreResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DocKey, DocumentLoader, SchemaOptions};

fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> StoreResult<Vec<T>> {
    docs.iter().map(Document::decode).collect()
}

/// One document by id, or `None` when absent.
pub async fn by_id<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
) -> StoreResult<Option<T>> {
    store
        .get(collection, id)
        .await?
        .map(|doc| doc.decode())
        .transpose()
}

/// Every document in `collection`, or only the one matching `id` (an empty
/// list when it does not exist).
pub async fn collection_or_one<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: Option<&str>,
) -> StoreResult<Vec<T>> {
    match id {
        Some(id) => Ok(by_id(store, collection, id).await?.into_iter().collect()),
        None => decode_all(store.list(collection).await?),
    }
}

pub async fn where_eq<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    value: &Value,
) -> StoreResult<Vec<T>> {
    decode_all(store.find_eq(collection, field, value).await?)
}

pub(crate) fn store<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a SharedStore> {
    ctx.data::<SharedStore>()
}

pub(crate) fn options(ctx: &Context<'_>) -> SchemaOptions {
    ctx.data_opt::<SchemaOptions>().copied().unwrap_or_default()
}

/// Settle a nullable field. A failure is recorded against the field and the
/// field resolves to `null`, leaving its siblings intact.
pub(crate) fn nullable<T>(ctx: &Context<'_>, result: async_graphql::Result<Option<T>>) -> Option<T> {
    result.unwrap_or_else(|err| {
        ctx.add_error(ctx.set_error_path(err.into_server_error(ctx.item.pos)));
        None
    })
}

/// Point lookup from a resolver. Goes through the request's loader when one
/// is attached, otherwise straight to the store.
pub(crate) async fn lookup<T: DeserializeOwned>(
    ctx: &Context<'_>,
    collection: &'static str,
    id: &str,
) -> async_graphql::Result<Option<T>> {
    let doc = match ctx.data_opt::<DataLoader<DocumentLoader>>() {
        Some(loader) => loader
            .load_one(DocKey::new(collection, id))
            .await
            .map_err(|err| err.extend())?,
        None => store(ctx)?
            .get(collection, id)
            .await
            .map_err(internal_error)?,
    };
    doc.map(|doc| doc.decode())
        .transpose()
        .map_err(internal_error)
}
