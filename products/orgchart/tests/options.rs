mod common;

use std::{sync::Arc, time::Duration};

use async_graphql::{Request, Value as GqlValue};
use common::{
    CountingStore, DownStore, NoPointReadsStore, ReadOnlyStore, add_department, data, memory_chart,
    shared,
};
use orgchart::{DEPARTMENTS, EMPLOYEES, OrgChart, SchemaOptions, WriteMode, seed_demo};
use serde_json::{Value, json};

fn error_code(response: &async_graphql::Response) -> Option<GqlValue> {
    response
        .errors
        .first()
        .and_then(|err| err.extensions.as_ref())
        .and_then(|ext| ext.get("code"))
        .cloned()
}

#[tokio::test]
async fn confirmed_writes_surface_store_failures() {
    let chart = OrgChart::new(shared(ReadOnlyStore::default()), SchemaOptions::default());

    let response = chart
        .execute(Request::new(r#"mutation { addDepartment(name: "Eng") { id } }"#))
        .await;
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].message, "internal server error");
    assert_eq!(error_code(&response), Some(GqlValue::from("INTERNAL")));
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "addDepartment": null })
    );

    let response = chart
        .execute(Request::new(r#"mutation { deleteEmployee(id: "e1") }"#))
        .await;
    assert_eq!(error_code(&response), Some(GqlValue::from("INTERNAL")));
}

#[tokio::test]
async fn accepted_writes_return_the_intended_record() {
    let options = SchemaOptions {
        write_mode: WriteMode::Accepted,
        ..SchemaOptions::default()
    };
    let chart = OrgChart::new(shared(ReadOnlyStore::default()), options);

    let body = data(
        &chart,
        r#"mutation { addDepartment(name: "Eng") { id name } }"#,
        Value::Null,
    )
    .await;
    assert_eq!(body["addDepartment"]["name"], json!("Eng"));
    assert!(!body["addDepartment"]["id"].as_str().unwrap().is_empty());

    let body = data(&chart, r#"mutation { deleteDepartment(id: "d1") }"#, Value::Null).await;
    assert_eq!(body["deleteDepartment"], json!("d1"));
}

#[tokio::test]
async fn accepted_writes_eventually_land() {
    let options = SchemaOptions {
        write_mode: WriteMode::Accepted,
        ..SchemaOptions::default()
    };
    let (store, chart) = memory_chart(options);
    add_department(&chart, "Eng").await;

    for _ in 0..50 {
        if store.len(DEPARTMENTS).await == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("accepted write never reached the store");
}

#[tokio::test]
async fn query_failures_are_masked_errors() {
    let chart = OrgChart::new(shared(DownStore), SchemaOptions::default());

    let response = chart
        .execute(Request::new(r#"{ employees { id } employee(id: "e1") { id } }"#))
        .await;
    assert_eq!(response.errors.len(), 2);
    for err in &response.errors {
        assert_eq!(err.message, "internal server error");
    }
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "employees": null, "employee": null })
    );
}

#[tokio::test]
async fn failing_nested_fields_resolve_to_null_beside_their_siblings() {
    let store = NoPointReadsStore::default();
    seed_demo(&store.inner).await.unwrap();
    let chart = OrgChart::new(shared(store), SchemaOptions::default());

    let response = chart
        .execute(Request::new(
            "{ employees { name department { name } } departments { name } }",
        ))
        .await;
    assert_eq!(response.errors.len(), 4);
    for err in &response.errors {
        assert_eq!(err.message, "internal server error");
        assert!(!err.path.is_empty());
    }

    let body = response.data.into_json().unwrap();
    let employees = body["employees"].as_array().unwrap();
    assert_eq!(employees.len(), 4);
    for employee in employees {
        let fields = employee.as_object().unwrap();
        assert_eq!(fields.get("department"), Some(&Value::Null));
        assert!(fields["name"].is_string());
    }
    assert_eq!(body["departments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reference_checks_reject_dangling_ids() {
    let options = SchemaOptions {
        check_references: true,
        ..SchemaOptions::default()
    };
    let (store, chart) = memory_chart(options);
    let dept = add_department(&chart, "Eng").await;

    let response = common::run_with(
        &chart,
        "mutation($d: ID!) { addEmployee(name: \"Alice\", parentId: \"ghost\", departmentId: $d) { id } }",
        json!({ "d": dept }),
    )
    .await;
    assert_eq!(error_code(&response), Some(GqlValue::from("INVALID_INPUT")));

    let response = common::run(
        &chart,
        r#"mutation { addEmployee(name: "Alice", parentId: "", departmentId: "nowhere") { id } }"#,
    )
    .await;
    assert_eq!(error_code(&response), Some(GqlValue::from("INVALID_INPUT")));
    assert_eq!(store.len(EMPLOYEES).await, 0);

    let root = common::add_employee(&chart, "Ada", "", &dept).await;
    common::add_employee(&chart, "Grace", &root, &dept).await;
    assert_eq!(store.len(EMPLOYEES).await, 2);
}

#[tokio::test]
async fn unchecked_references_are_stored_as_given() {
    let (_store, chart) = memory_chart(SchemaOptions::default());
    let id = common::add_employee(&chart, "Alice", "ghost", "nowhere").await;

    let body = data(
        &chart,
        "query($id: ID) { employee(id: $id) { name parent { id } department { id } } }",
        json!({ "id": id }),
    )
    .await;
    assert_eq!(
        body["employee"],
        json!({ "name": "Alice", "parent": null, "department": null })
    );
}

const DEPARTMENT_OF_EVERYONE: &str = "{ employees { name department { name } } }";

#[tokio::test]
async fn unbatched_lookups_read_once_per_field() {
    let store = Arc::new(CountingStore::default());
    seed_demo(store.as_ref()).await.unwrap();
    let chart = OrgChart::new(store.clone(), SchemaOptions::default());

    let body = data(&chart, DEPARTMENT_OF_EVERYONE, Value::Null).await;
    assert_eq!(body["employees"].as_array().unwrap().len(), 4);
    assert_eq!(store.gets(), 4);
    assert_eq!(store.batched_gets(), 0);
}

#[tokio::test]
async fn batched_lookups_share_one_read() {
    let store = Arc::new(CountingStore::default());
    seed_demo(store.as_ref()).await.unwrap();
    let options = SchemaOptions {
        batch_lookups: true,
        ..SchemaOptions::default()
    };
    let chart = OrgChart::new(store.clone(), options);

    let body = data(&chart, DEPARTMENT_OF_EVERYONE, Value::Null).await;
    let mut names: Vec<_> = body["employees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|emp| emp["department"]["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec!["Engineering", "Engineering", "Operations", "Operations"]
    );
    assert_eq!(store.gets(), 0);
    assert_eq!(store.batched_gets(), 1);
}
