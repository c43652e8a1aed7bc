use async_trait::async_trait;
use entity::documents;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, Database, DatabaseBackend,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Statement,
    sea_query::{Expr, OnConflict},
};
use serde_json::Value;
use tracing::debug;

use crate::{Document, DocumentStore, Fields, StoreError, StoreResult};

/// Document store over the `documents` table. Bodies are JSON text; equality
/// filters are evaluated by the database.
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let db = Database::connect(url).await?;
        Ok(Self { db })
    }

    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn to_document(model: documents::Model) -> StoreResult<Document> {
    let fields: Fields = serde_json::from_str(&model.data)?;
    Ok(Document::new(model.id, fields))
}

fn to_documents(models: Vec<documents::Model>) -> StoreResult<Vec<Document>> {
    models.into_iter().map(to_document).collect()
}

#[async_trait]
impl DocumentStore for SqlStore {
    fn backend(&self) -> &'static str {
        match self.db.get_database_backend() {
            DatabaseBackend::Postgres => "postgres",
            DatabaseBackend::Sqlite => "sqlite",
            DatabaseBackend::MySql => "mysql",
        }
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        documents::Entity::find_by_id((collection.to_string(), id.to_string()))
            .one(&self.db)
            .await?
            .map(to_document)
            .transpose()
    }

    async fn get_many(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .filter(documents::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.db)
            .await?;
        to_documents(models)
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let models = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .order_by_asc(documents::Column::Id)
            .all(&self.db)
            .await?;
        to_documents(models)
    }

    async fn find_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        let matches = match self.db.get_database_backend() {
            DatabaseBackend::Postgres => Expr::cust_with_values(
                r#"CAST("data" AS jsonb) -> $1 = CAST($2 AS jsonb)"#,
                [field.to_string(), value.to_string()],
            ),
            // SQLite placeholders are positional `?`, never `$N`.
            DatabaseBackend::Sqlite => Expr::cust_with_values(
                r#"json_extract("data", ?) = json_extract(?, ?)"#,
                [format!("$.{field}"), value.to_string(), "$".to_string()],
            ),
            DatabaseBackend::MySql => {
                return Err(StoreError::Unsupported("equality filters on MySQL"));
            }
        };
        debug!(collection, field, %value, "filtered document scan");
        let models = documents::Entity::find()
            .filter(documents::Column::Collection.eq(collection))
            .filter(matches)
            .order_by_asc(documents::Column::Id)
            .all(&self.db)
            .await?;
        to_documents(models)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let model = documents::ActiveModel {
            collection: Set(collection.to_string()),
            id: Set(id.to_string()),
            data: Set(serde_json::to_string(&fields)?),
        };
        documents::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([documents::Column::Collection, documents::Column::Id])
                    .update_column(documents::Column::Data)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        documents::Entity::delete_by_id((collection.to_string(), id.to_string()))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }

    /// Closes the pool shared by every clone of the connection.
    async fn close(&self) -> StoreResult<()> {
        self.db.clone().close().await?;
        debug!(backend = self.backend(), "connection pool closed");
        Ok(())
    }
}
