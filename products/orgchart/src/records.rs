use serde::{Deserialize, Serialize};

pub const EMPLOYEES: &str = "employees";
pub const DEPARTMENTS: &str = "departments";

/// Field holding an employee's department, used for the reverse lookup.
pub const DEPARTMENT_ID_FIELD: &str = "departmentId";

/// Stored shape of an employee. Everything but `id` may be missing from a
/// stored document; such fields resolve to `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
