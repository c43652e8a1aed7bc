#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_graphql::{Request, Response, Variables};
use async_trait::async_trait;
use orgchart::{OrgChart, SchemaOptions};
use platform_store::{
    Document, DocumentStore, Fields, MemoryStore, SharedStore, StoreError, StoreResult,
};
use serde_json::Value;

pub fn memory_chart(options: SchemaOptions) -> (Arc<MemoryStore>, OrgChart) {
    let store = Arc::new(MemoryStore::new());
    let chart = OrgChart::new(store.clone(), options);
    (store, chart)
}

pub async fn run(chart: &OrgChart, query: &str) -> Response {
    chart.execute(Request::new(query)).await
}

pub async fn run_with(chart: &OrgChart, query: &str, variables: Value) -> Response {
    chart
        .execute(Request::new(query).variables(Variables::from_json(variables)))
        .await
}

/// Execute and return `data` as JSON, failing on any GraphQL error.
pub async fn data(chart: &OrgChart, query: &str, variables: Value) -> Value {
    let response = run_with(chart, query, variables).await;
    assert!(
        response.errors.is_empty(),
        "unexpected errors: {:?}",
        response.errors
    );
    response.data.into_json().unwrap()
}

pub async fn add_department(chart: &OrgChart, name: &str) -> String {
    let body = data(
        chart,
        "mutation($name: String!) { addDepartment(name: $name) { id name } }",
        serde_json::json!({ "name": name }),
    )
    .await;
    body["addDepartment"]["id"].as_str().unwrap().to_string()
}

pub async fn add_employee(chart: &OrgChart, name: &str, parent_id: &str, department_id: &str) -> String {
    let body = data(
        chart,
        "mutation($name: String!, $parentId: ID!, $departmentId: ID!) {
            addEmployee(name: $name, parentId: $parentId, departmentId: $departmentId) { id }
        }",
        serde_json::json!({
            "name": name,
            "parentId": parent_id,
            "departmentId": department_id,
        }),
    )
    .await;
    body["addEmployee"]["id"].as_str().unwrap().to_string()
}

/// Counts point reads made against the wrapped store.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    pub gets: AtomicUsize,
    pub batched_gets: AtomicUsize,
}

impl CountingStore {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn batched_gets(&self) -> usize {
        self.batched_gets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    fn backend(&self) -> &'static str {
        "counting"
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(collection, id).await
    }

    async fn get_many(&self, collection: &str, ids: &[String]) -> StoreResult<Vec<Document>> {
        self.batched_gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_many(collection, ids).await
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn find_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        self.inner.find_eq(collection, field, value).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.set(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }
}

/// Reads succeed against an empty store; every write fails.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for ReadOnlyStore {
    fn backend(&self) -> &'static str {
        "read-only"
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn find_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        self.inner.find_eq(collection, field, value).await
    }

    async fn set(&self, _collection: &str, _id: &str, _fields: Fields) -> StoreResult<()> {
        Err(StoreError::Unavailable("permission denied".into()))
    }

    async fn delete(&self, _collection: &str, _id: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("permission denied".into()))
    }
}

/// Every call fails, as when the backend is unreachable.
pub struct DownStore;

#[async_trait]
impl DocumentStore for DownStore {
    fn backend(&self) -> &'static str {
        "down"
    }

    async fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn list(&self, _collection: &str) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_eq(&self, _collection: &str, _field: &str, _value: &Value) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _collection: &str, _id: &str, _fields: Fields) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _collection: &str, _id: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Scans work; every point read fails.
#[derive(Default)]
pub struct NoPointReadsStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl DocumentStore for NoPointReadsStore {
    fn backend(&self) -> &'static str {
        "no-point-reads"
    }

    async fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
        Err(StoreError::Unavailable("read timed out".into()))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.list(collection).await
    }

    async fn find_eq(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        self.inner.find_eq(collection, field, value).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.set(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }
}

pub fn shared<S: DocumentStore + 'static>(store: S) -> SharedStore {
    Arc::new(store)
}
