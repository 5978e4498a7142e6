mod common;

use axum::http::StatusCode;
use common::{app, enc, registrar, send};
use entity_rest::{load_from_path, resolve, EndpointOptions, EntityDescriptor, FieldDescriptor, FieldType, Verb};
use serde_json::json;
use std::sync::Arc;

fn account() -> Arc<EntityDescriptor> {
    Arc::new(
        EntityDescriptor::builder("account")
            .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement().hidden())
            .field(FieldDescriptor::new("email", FieldType::String).not_null().no_update())
            .field(FieldDescriptor::new("name", FieldType::String))
            .field(FieldDescriptor::new("role", FieldType::String).no_create())
            .primary_key(["id"])
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn hidden_fields_never_leave_the_api() {
    let mut reg = registrar();
    reg.add_all(account(), &Verb::ALL, EndpointOptions::default()).unwrap();
    let app = app(&reg);

    let (status, created) = send(&app, "POST", "/api/v1/account", Some(json!({"email": "a@x", "name": "a"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"email": "a@x", "name": "a", "role": null}));

    let (status, fetched) = send(&app, "GET", "/api/v1/account/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched.get("id").is_none());

    let (_, listed) = send(&app, "GET", "/api/v1/accounts", None).await;
    assert_eq!(listed, json!([{"email": "a@x", "name": "a", "role": null}]));

    let uri = format!("/api/v1/accounts?filter={}", enc("id=1"));
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "filter_error");

    let (status, _) = send(&app, "GET", "/api/v1/accounts?orderby=id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn no_create_and_no_update_fields_are_ignored() {
    let mut reg = registrar();
    reg.add_all(account(), &Verb::ALL, EndpointOptions::default()).unwrap();
    let app = app(&reg);

    let (_, created) = send(
        &app,
        "POST",
        "/api/v1/account",
        Some(json!({"email": "a@x", "name": "a", "role": "admin"})),
    )
    .await;
    assert_eq!(created["role"], serde_json::Value::Null);

    let (status, patched) = send(
        &app,
        "PATCH",
        "/api/v1/account/1",
        Some(json!({"email": "b@x", "role": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched, json!({"email": "a@x", "name": "a", "role": "admin"}));

    // replace overwrites every updatable field and leaves email alone
    let (_, replaced) = send(&app, "PUT", "/api/v1/account/1", Some(json!({"email": "c@x"}))).await;
    assert_eq!(replaced, json!({"email": "a@x", "name": null, "role": null}));
}

#[tokio::test]
async fn comment_flags_from_config_apply() {
    let model = resolve(&load_from_path(concat!(env!("CARGO_MANIFEST_DIR"), "/sample")).unwrap()).unwrap();
    let mut reg = registrar();
    reg.register_resolved(&model).unwrap();
    let app = app(&reg);

    let (status, created) = send(
        &app,
        "POST",
        "/api/v1/user",
        Some(json!({
            "email": "a@x",
            "name": "a",
            "password": "plain",
            "created_at": "2024-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"id": 1, "email": "a@x", "name": "a", "created_at": null}));

    let (status, _) = send(&app, "PUT", "/api/v1/user/1", Some(json!({"name": "b"}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (status, _) = send(&app, "DELETE", "/api/v1/user/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = send(&app, "GET", "/api/v1/todos", None).await;
    assert_eq!(status, StatusCode::OK);
}
