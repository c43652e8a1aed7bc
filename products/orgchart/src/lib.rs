//! Org chart vertical slice.
//!
//! Employees and departments live in a [`DocumentStore`](platform_store::DocumentStore)
//! and are exposed through a GraphQL schema. Related entities (an employee's
//! manager and department, a department's members) are resolved lazily, only
//! when a query selects them.

pub mod fetch;
pub mod loader;
pub mod records;
pub mod schema;
pub mod seed;

use std::str::FromStr;

use async_graphql::{EmptySubscription, Request, Response, Schema};
use platform_store::SharedStore;
use thiserror::Error;

pub use loader::{DocKey, DocumentLoader};
pub use records::{DEPARTMENTS, DepartmentRecord, EMPLOYEES, EmployeeRecord};
pub use schema::{Department, Employee, MutationRoot, QueryRoot};
pub use seed::{SeededOrgChart, seed_demo};

pub type OrgChartSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// How mutations treat the store write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Await the write; a failed write fails the mutation.
    #[default]
    Confirmed,
    /// Spawn the write and return the intended value immediately. Failures
    /// are only logged: the result means "accepted", not "stored".
    Accepted,
}

#[derive(Debug, Error)]
#[error("unknown write mode {0:?} (expected confirmed|accepted)")]
pub struct UnknownWriteMode(String);

impl FromStr for WriteMode {
    type Err = UnknownWriteMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(Self::Confirmed),
            "accepted" => Ok(Self::Accepted),
            _ => Err(UnknownWriteMode(raw.to_string())),
        }
    }
}

/// Behaviour switches attached to the schema as context data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchemaOptions {
    pub write_mode: WriteMode,
    /// Reject `addEmployee` when `parentId` or `departmentId` do not resolve.
    /// An empty `parentId` marks a root employee and is never checked.
    pub check_references: bool,
    /// Give every operation its own [`DocumentLoader`] so point lookups are
    /// batched and deduplicated. Off means one store read per field instance.
    pub batch_lookups: bool,
}

pub fn build_schema(store: SharedStore, options: SchemaOptions) -> OrgChartSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(store)
        .data(options)
        .finish()
}

/// The schema bundled with the store it reads from, so per-request data can
/// be attached before execution.
#[derive(Clone)]
pub struct OrgChart {
    schema: OrgChartSchema,
    store: SharedStore,
    options: SchemaOptions,
}

impl OrgChart {
    pub fn new(store: SharedStore, options: SchemaOptions) -> Self {
        Self {
            schema: build_schema(store.clone(), options),
            store,
            options,
        }
    }

    pub fn schema(&self) -> &OrgChartSchema {
        &self.schema
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn options(&self) -> SchemaOptions {
        self.options
    }

    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let mut request = request.into();
        if self.options.batch_lookups {
            request = request.data(DocumentLoader::per_request(self.store.clone()));
        }
        self.schema.execute(request).await
    }
}
