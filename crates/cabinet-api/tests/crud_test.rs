mod helpers;

use cabinet_core::constants::TENANT_HEADER;
use helpers::{api_path, id_of, setup_test_app, SUPER_TENANT};
use serde_json::{json, Value};

#[tokio::test]
async fn test_missing_tenant_header_is_rejected() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/documents")).await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .client()
        .get(&api_path("/documents"))
        .add_header(TENANT_HEADER, "   ")
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_create_assigns_tenant_and_code() {
    let app = setup_test_app().await;

    let created = app.create_document("acme", "Invoice").await;
    assert_eq!(created["tenant"], "acme");
    assert!(!created["code"].as_str().unwrap_or_default().is_empty());
    assert_eq!(created["canceled"], false);

    let code = created["code"].as_str().unwrap();
    let response = app.get("acme", &format!("/documents/code/{}", code)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(id_of(&response.json::<Value>()), id_of(&created));
}

#[tokio::test]
async fn test_explicit_code_is_kept() {
    let app = setup_test_app().await;

    let response = app
        .post_json("acme", "/documents", &json!({ "title": "Order", "code": "ORD-42" }))
        .await;
    assert_eq!(response.status_code(), 201);
    assert_eq!(response.json::<Value>()["code"], "ORD-42");
}

#[tokio::test]
async fn test_other_tenant_is_forbidden() {
    let app = setup_test_app().await;
    let created = app.create_document("acme", "Contract").await;
    let id = id_of(&created);

    let response = app.get("globex", &format!("/documents/{}", id)).await;
    assert_eq!(response.status_code(), 403);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "TENANT_NOT_ALLOWED");

    let response = app.delete("globex", &format!("/documents/{}", id)).await;
    assert_eq!(response.status_code(), 403);

    // the owner and the super tenant still see it
    assert_eq!(app.get("acme", &format!("/documents/{}", id)).await.status_code(), 200);
    assert_eq!(
        app.get(SUPER_TENANT, &format!("/documents/{}", id)).await.status_code(),
        200
    );
}

#[tokio::test]
async fn test_listing_is_tenant_scoped() {
    let app = setup_test_app().await;
    app.create_document("acme", "A1").await;
    app.create_document("acme", "A2").await;
    app.create_document("globex", "G1").await;

    let acme = app.get("acme", "/documents").await.json::<Vec<Value>>();
    assert_eq!(acme.len(), 2);
    assert!(acme.iter().all(|d| d["tenant"] == "acme"));

    let all = app.get(SUPER_TENANT, "/documents").await.json::<Vec<Value>>();
    assert_eq!(all.len(), 3);

    let count = app.get("globex", "/documents/count").await.json::<Value>();
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_update_cannot_move_record_to_another_tenant() {
    let app = setup_test_app().await;
    let mut created = app.create_document("acme", "Draft").await;
    created["title"] = json!("Final");
    created["tenant"] = json!("globex");

    let response = app.put_json("acme", "/documents", &created).await;
    assert_eq!(response.status_code(), 200);
    let updated = response.json::<Value>();
    assert_eq!(updated["title"], "Final");
    assert_eq!(updated["tenant"], "acme");
}

#[tokio::test]
async fn test_delete_cancels_document() {
    let app = setup_test_app().await;
    let created = app.create_document("acme", "Quote").await;
    let id = id_of(&created);

    let response = app.delete("acme", &format!("/documents/{}", id)).await;
    assert_eq!(response.status_code(), 204);

    // still readable by id, but flagged and out of the listing
    let response = app.get("acme", &format!("/documents/{}", id)).await;
    assert_eq!(response.status_code(), 200);
    let canceled = response.json::<Value>();
    assert_eq!(canceled["canceled"], true);
    assert!(canceled["canceled_at"].is_string());

    let listed = app.get("acme", "/documents").await.json::<Vec<Value>>();
    assert!(listed.is_empty());
    let count = app.get("acme", "/documents/count").await.json::<Value>();
    assert_eq!(count["count"], 0);

    // a second delete keeps the first cancel date
    let response = app.delete("acme", &format!("/documents/{}", id)).await;
    assert_eq!(response.status_code(), 204);
    let again = app
        .get("acme", &format!("/documents/{}", id))
        .await
        .json::<Value>();
    assert_eq!(again["canceled_at"], canceled["canceled_at"]);
}

#[tokio::test]
async fn test_delete_removes_profile() {
    let app = setup_test_app().await;
    let created = app.create_profile("acme", "alice").await;
    let id = id_of(&created);

    let response = app.delete("acme", &format!("/profiles/{}", id)).await;
    assert_eq!(response.status_code(), 204);

    let response = app.get("acme", &format!("/profiles/{}", id)).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_invalid_entity_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .post_json("acme", "/profiles", &json!({ "name": "bob", "email": "not-an-email" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app.post_json("acme", "/documents", &json!({ "title": "" })).await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_batch_operations() {
    let app = setup_test_app().await;

    let response = app
        .post_json(
            "acme",
            "/documents/batch",
            &json!([{ "title": "One" }, { "title": "Two" }, { "title": "Three" }]),
        )
        .await;
    assert_eq!(response.status_code(), 201);
    let mut created = response.json::<Vec<Value>>();
    assert_eq!(created.len(), 3);

    for doc in created.iter_mut() {
        doc["description"] = json!("batched");
    }
    let response = app.put_json("acme", "/documents/batch", &json!(created)).await;
    assert_eq!(response.status_code(), 200);
    let updated = response.json::<Vec<Value>>();
    assert!(updated.iter().all(|d| d["description"] == "batched"));

    let ids: Vec<String> = created.iter().map(id_of).collect();
    let response = app
        .client()
        .delete(&api_path("/documents/batch"))
        .add_header(TENANT_HEADER, "acme")
        .json(&json!({ "ids": ids }))
        .await;
    assert_eq!(response.status_code(), 204);

    let count = app.get("acme", "/documents/count").await.json::<Value>();
    assert_eq!(count["count"], 0);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let app = setup_test_app().await;

    let response = app.post_json("acme", "/documents/batch", &json!([])).await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["code"], "EMPTY_LIST");
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .get("acme", &format!("/documents/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = setup_test_app().await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body = response.json::<Value>();
    assert_eq!(body["persistence"], "memory");
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.client().get("/health/live").await;
    assert_eq!(response.status_code(), 200);
}
