//! Test helpers: build AppState and router for integration tests.
//!
//! Records live in memory, files under a temp dir and object storage in the
//! in-memory adapters, so no external services are needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use cabinet_api::constants;
use cabinet_api::setup::routes::setup_routes;
use cabinet_api::setup::services::build_state;
use cabinet_api::state::{AppState, Persistence};
use cabinet_core::constants::TENANT_HEADER;
use cabinet_core::{CabinetConfig, Config};
use cabinet_services::ObjectStorageRegistry;
use cabinet_storage::LocalFileBackend;
use serde_json::Value;
use tempfile::TempDir;

pub const SUPER_TENANT: &str = "super";

/// API path prefix for tests (e.g. `/api/v1`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn get(&self, tenant: &str, path: &str) -> TestResponse {
        self.server
            .get(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .await
    }

    pub async fn post_json(&self, tenant: &str, path: &str, body: &Value) -> TestResponse {
        self.server
            .post(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .json(body)
            .await
    }

    pub async fn put_json(&self, tenant: &str, path: &str, body: &Value) -> TestResponse {
        self.server
            .put(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .json(body)
            .await
    }

    pub async fn delete(&self, tenant: &str, path: &str) -> TestResponse {
        self.server
            .delete(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .await
    }

    pub async fn post_multipart(&self, tenant: &str, path: &str, form: MultipartForm) -> TestResponse {
        self.server
            .post(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .multipart(form)
            .await
    }

    pub async fn put_multipart(&self, tenant: &str, path: &str, form: MultipartForm) -> TestResponse {
        self.server
            .put(&api_path(path))
            .add_header(TENANT_HEADER, tenant)
            .multipart(form)
            .await
    }

    /// Create a document and return its JSON
    pub async fn create_document(&self, tenant: &str, title: &str) -> Value {
        let response = self
            .post_json(tenant, "/documents", &serde_json::json!({ "title": title }))
            .await;
        assert_eq!(response.status_code(), 201);
        response.json::<Value>()
    }

    /// Create a profile and return its JSON
    pub async fn create_profile(&self, tenant: &str, name: &str) -> Value {
        let response = self
            .post_json(
                tenant,
                "/profiles",
                &serde_json::json!({ "name": name, "email": format!("{}@example.com", name) }),
            )
            .await;
        assert_eq!(response.status_code(), 201);
        response.json::<Value>()
    }
}

/// A file part as a browser would send it
pub fn file_part(name: &str, content_type: &str, data: &[u8]) -> Part {
    Part::bytes(data.to_vec())
        .file_name(name.to_string())
        .mime_type(content_type.to_string())
}

pub fn id_of(value: &Value) -> String {
    value["id"]
        .as_str()
        .expect("record has an id")
        .to_string()
}

/// Setup test application with in-memory persistence
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_registry(ObjectStorageRegistry::in_memory()).await
}

/// Like [`setup_test_app`], with a chosen set of object storage adapters
pub async fn setup_test_app_with_registry(registry: ObjectStorageRegistry) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let config = Config(Box::new(CabinetConfig {
        upload_root: temp_dir.path().to_path_buf(),
        super_tenant: SUPER_TENANT.to_string(),
        ..Default::default()
    }));

    let file_backend = LocalFileBackend::new(temp_dir.path())
        .await
        .expect("Failed to create local file backend");

    let state = build_state(
        config,
        Persistence::Memory,
        Arc::new(file_backend),
        registry,
    );

    let app = setup_routes(state.clone()).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
