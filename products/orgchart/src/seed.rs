use platform_store::{DocumentStore, StoreResult, encode};
use tracing::info;

use crate::records::{DEPARTMENTS, DepartmentRecord, EMPLOYEES, EmployeeRecord};

/// Records written by [`seed_demo`], in creation order.
#[derive(Clone, Debug, Default)]
pub struct SeededOrgChart {
    pub departments: Vec<DepartmentRecord>,
    pub employees: Vec<EmployeeRecord>,
}

impl SeededOrgChart {
    pub fn department(&self, name: &str) -> Option<&DepartmentRecord> {
        self.departments
            .iter()
            .find(|record| record.name.as_deref() == Some(name))
    }

    pub fn employee(&self, name: &str) -> Option<&EmployeeRecord> {
        self.employees
            .iter()
            .find(|record| record.name.as_deref() == Some(name))
    }
}

async fn add_department(
    store: &dyn DocumentStore,
    seeded: &mut SeededOrgChart,
    name: &str,
) -> StoreResult<String> {
    let record = DepartmentRecord {
        id: store.new_id(),
        name: Some(name.to_string()),
    };
    store.set(DEPARTMENTS, &record.id, encode(&record)?).await?;
    let id = record.id.clone();
    seeded.departments.push(record);
    Ok(id)
}

async fn add_employee(
    store: &dyn DocumentStore,
    seeded: &mut SeededOrgChart,
    name: &str,
    parent_id: &str,
    department_id: &str,
) -> StoreResult<String> {
    let record = EmployeeRecord {
        id: store.new_id(),
        name: Some(name.to_string()),
        parent_id: Some(parent_id.to_string()),
        department_id: Some(department_id.to_string()),
    };
    store.set(EMPLOYEES, &record.id, encode(&record)?).await?;
    let id = record.id.clone();
    seeded.employees.push(record);
    Ok(id)
}

/// Write a small demo chart: a root manager (empty `parentId`) over two
/// departments.
pub async fn seed_demo(store: &dyn DocumentStore) -> StoreResult<SeededOrgChart> {
    let mut seeded = SeededOrgChart::default();
    let engineering = add_department(store, &mut seeded, "Engineering").await?;
    let operations = add_department(store, &mut seeded, "Operations").await?;

    let ada = add_employee(store, &mut seeded, "Ada", "", &operations).await?;
    let grace = add_employee(store, &mut seeded, "Grace", &ada, &engineering).await?;
    add_employee(store, &mut seeded, "Linus", &grace, &engineering).await?;
    add_employee(store, &mut seeded, "Margaret", &ada, &operations).await?;

    info!(
        departments = seeded.departments.len(),
        employees = seeded.employees.len(),
        "seeded demo org chart"
    );
    Ok(seeded)
}
