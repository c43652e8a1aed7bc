use async_graphql::{Context, ID, Object};
use platform_api::{ApiError, graphql, internal_error};
use platform_store::{DocumentStore, Fields, SharedStore, StoreResult, encode};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    WriteMode,
    fetch::{self, lookup, nullable, options, store},
    records::{DEPARTMENT_ID_FIELD, DEPARTMENTS, DepartmentRecord, EMPLOYEES, EmployeeRecord},
};

/// `[T]` with nullable items, as the list fields are declared.
type NullableList<T> = Option<Vec<Option<T>>>;

fn nullable_list<R, T>(records: Vec<R>, wrap: impl Fn(R) -> T) -> NullableList<T> {
    Some(records.into_iter().map(|record| Some(wrap(record))).collect())
}

pub struct Employee(pub EmployeeRecord);

#[Object]
impl Employee {
    async fn id(&self) -> Option<ID> {
        Some(ID(self.0.id.clone()))
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    #[instrument(name = "graphql.employee.parent", skip_all)]
    async fn parent(&self, ctx: &Context<'_>) -> Option<Employee> {
        let parent_id = self.0.parent_id.as_deref()?;
        nullable(ctx, lookup::<EmployeeRecord>(ctx, EMPLOYEES, parent_id).await).map(Employee)
    }

    #[instrument(name = "graphql.employee.department", skip_all)]
    async fn department(&self, ctx: &Context<'_>) -> Option<Department> {
        let department_id = self.0.department_id.as_deref()?;
        nullable(
            ctx,
            lookup::<DepartmentRecord>(ctx, DEPARTMENTS, department_id).await,
        )
        .map(Department)
    }
}

pub struct Department(pub DepartmentRecord);

#[Object]
impl Department {
    async fn id(&self) -> Option<ID> {
        Some(ID(self.0.id.clone()))
    }

    async fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Derived on every read from the employees' `departmentId`.
    #[instrument(name = "graphql.department.employees", skip_all)]
    async fn employees(&self, ctx: &Context<'_>) -> NullableList<Employee> {
        let members = async {
            let members: Vec<EmployeeRecord> = fetch::where_eq(
                store(ctx)?.as_ref(),
                EMPLOYEES,
                DEPARTMENT_ID_FIELD,
                &Value::String(self.0.id.clone()),
            )
            .await
            .map_err(internal_error)?;
            Ok::<_, async_graphql::Error>(nullable_list(members, Employee))
        };
        nullable(ctx, members.await)
    }
}

#[derive(Default)]
pub struct QueryRoot;

#[Object(name = "RootQueryType")]
impl QueryRoot {
    /// A missing or unknown id resolves to `null`.
    #[instrument(name = "graphql.employee", skip_all)]
    async fn employee(&self, ctx: &Context<'_>, id: Option<ID>) -> Option<Employee> {
        let id = id?;
        nullable(ctx, lookup::<EmployeeRecord>(ctx, EMPLOYEES, id.as_str()).await).map(Employee)
    }

    #[instrument(name = "graphql.employees", skip_all)]
    async fn employees(&self, ctx: &Context<'_>) -> NullableList<Employee> {
        let records = async {
            let records: Vec<EmployeeRecord> =
                fetch::collection_or_one(store(ctx)?.as_ref(), EMPLOYEES, None)
                    .await
                    .map_err(internal_error)?;
            Ok::<_, async_graphql::Error>(nullable_list(records, Employee))
        };
        nullable(ctx, records.await)
    }

    #[instrument(name = "graphql.departments", skip_all)]
    async fn departments(&self, ctx: &Context<'_>) -> NullableList<Department> {
        let records = async {
            let records: Vec<DepartmentRecord> =
                fetch::collection_or_one(store(ctx)?.as_ref(), DEPARTMENTS, None)
                    .await
                    .map_err(internal_error)?;
            Ok::<_, async_graphql::Error>(nullable_list(records, Department))
        };
        nullable(ctx, records.await)
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object(name = "Mutation")]
impl MutationRoot {
    #[instrument(name = "graphql.add_employee", skip_all)]
    async fn add_employee(
        &self,
        ctx: &Context<'_>,
        name: String,
        parent_id: ID,
        department_id: ID,
    ) -> Option<Employee> {
        nullable(ctx, insert_employee(ctx, name, parent_id, department_id).await)
    }

    #[instrument(name = "graphql.add_department", skip_all)]
    async fn add_department(&self, ctx: &Context<'_>, name: String) -> Option<Department> {
        nullable(ctx, insert_department(ctx, name).await)
    }

    /// Returns `id` whether or not the employee existed. Subordinates keep
    /// their now dangling `parentId`.
    #[instrument(name = "graphql.delete_employee", skip_all)]
    async fn delete_employee(&self, ctx: &Context<'_>, id: ID) -> Option<ID> {
        nullable(ctx, delete(ctx, EMPLOYEES, id).await)
    }

    /// Members of the department are left with a dangling `departmentId`.
    #[instrument(name = "graphql.delete_department", skip_all)]
    async fn delete_department(&self, ctx: &Context<'_>, id: ID) -> Option<ID> {
        nullable(ctx, delete(ctx, DEPARTMENTS, id).await)
    }
}

async fn insert_employee(
    ctx: &Context<'_>,
    name: String,
    parent_id: ID,
    department_id: ID,
) -> async_graphql::Result<Option<Employee>> {
    let store = store(ctx)?;
    let options = options(ctx);
    if options.check_references {
        if !parent_id.is_empty() {
            graphql(ensure_exists(store.as_ref(), EMPLOYEES, "parentId", &parent_id).await)?;
        }
        graphql(
            ensure_exists(store.as_ref(), DEPARTMENTS, "departmentId", &department_id).await,
        )?;
    }

    let record = EmployeeRecord {
        id: store.new_id(),
        name: Some(name),
        parent_id: Some(parent_id.0),
        department_id: Some(department_id.0),
    };
    let fields = encode(&record).map_err(internal_error)?;
    write(
        store,
        options.write_mode,
        Write::Set {
            collection: EMPLOYEES,
            id: record.id.clone(),
            fields,
        },
    )
    .await?;
    info!(employee_id = %record.id, "employee added");
    Ok(Some(Employee(record)))
}

async fn insert_department(
    ctx: &Context<'_>,
    name: String,
) -> async_graphql::Result<Option<Department>> {
    let store = store(ctx)?;
    let record = DepartmentRecord {
        id: store.new_id(),
        name: Some(name),
    };
    let fields = encode(&record).map_err(internal_error)?;
    write(
        store,
        options(ctx).write_mode,
        Write::Set {
            collection: DEPARTMENTS,
            id: record.id.clone(),
            fields,
        },
    )
    .await?;
    info!(department_id = %record.id, "department added");
    Ok(Some(Department(record)))
}

async fn delete(
    ctx: &Context<'_>,
    collection: &'static str,
    id: ID,
) -> async_graphql::Result<Option<ID>> {
    write(
        store(ctx)?,
        options(ctx).write_mode,
        Write::Delete {
            collection,
            id: id.0.clone(),
        },
    )
    .await?;
    info!(collection, id = %id.as_str(), "document deleted");
    Ok(Some(id))
}

async fn ensure_exists(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    id: &str,
) -> Result<(), ApiError> {
    match store.get(collection, id).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ApiError::invalid_input(format!(
            "{field} {id:?} does not reference an existing document"
        ))),
        Err(err) => Err(ApiError::internal(err.into())),
    }
}

enum Write {
    Set {
        collection: &'static str,
        id: String,
        fields: Fields,
    },
    Delete {
        collection: &'static str,
        id: String,
    },
}

impl Write {
    fn target(&self) -> (&'static str, String) {
        match self {
            Write::Set { collection, id, .. } | Write::Delete { collection, id } => {
                (*collection, id.clone())
            }
        }
    }

    async fn apply(self, store: &dyn DocumentStore) -> StoreResult<()> {
        match self {
            Write::Set {
                collection,
                id,
                fields,
            } => store.set(collection, &id, fields).await,
            Write::Delete { collection, id } => store.delete(collection, &id).await,
        }
    }
}

async fn write(store: &SharedStore, mode: WriteMode, op: Write) -> async_graphql::Result<()> {
    match mode {
        WriteMode::Confirmed => op.apply(store.as_ref()).await.map_err(internal_error),
        WriteMode::Accepted => {
            let store = store.clone();
            tokio::spawn(async move {
                let (collection, id) = op.target();
                if let Err(err) = op.apply(store.as_ref()).await {
                    warn!(collection, id = %id, error = %err, "accepted write was not stored");
                }
            });
            Ok(())
        }
    }
}
