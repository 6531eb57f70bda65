//! S3 adapter tests against a throwaway MinIO container.
//!
//! Requires Docker: `cargo test -p cabinet-services -- --ignored`.

use std::collections::HashMap;
use std::time::Duration;

use cabinet_core::{ObjectStorageProvider, StorageConnection};
use cabinet_services::{
    FilterOperator, ObjectStorage, ObjectStorageError, ObjectUpload, RetryPolicy,
    S3CompatibleStorage, TagFilter,
};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;

async fn setup() -> (S3CompatibleStorage, StorageConnection, ContainerAsync<MinIO>) {
    let container = MinIO::default()
        .start()
        .await
        .expect("Failed to start minio container");
    let port = container
        .get_host_port_ipv4(9000)
        .await
        .expect("Failed to read minio port");

    let conn = StorageConnection {
        id: None,
        tenant: Some("acme".to_string()),
        provider: ObjectStorageProvider::Minio,
        endpoint: format!("http://127.0.0.1:{}", port),
        access_key: "minioadmin".to_string(),
        secret_key: "minioadmin".to_string(),
        region: None,
        branch: None,
        storage_namespace: None,
    };
    let storage = S3CompatibleStorage::new(
        ObjectStorageProvider::Minio,
        RetryPolicy::new(3, Duration::from_millis(200)),
    )
    .expect("minio is an S3 flavor");
    (storage, conn, container)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_bucket_and_object_scenario() {
    let (storage, conn, _container) = setup().await;

    storage.make_bucket(&conn, "test-bucket").await.unwrap();
    assert!(storage.bucket_exists(&conn, "test-bucket").await.unwrap());
    assert!(!storage.bucket_exists(&conn, "missing-bucket").await.unwrap());

    storage
        .upload_object(
            &conn,
            "test-bucket",
            ObjectUpload::new("test-object.txt", "Test content").with_content_type("text/plain"),
        )
        .await
        .unwrap();
    let data = storage
        .download_object(&conn, "test-bucket", "test-object.txt")
        .await
        .unwrap();
    assert_eq!(&data[..], b"Test content");

    let stat = storage
        .stat_object(&conn, "test-bucket", "test-object.txt")
        .await
        .unwrap();
    assert_eq!(stat.size, 12);

    let url = storage
        .presigned_get_url(&conn, "test-bucket", "test-object.txt", Duration::from_secs(300))
        .await
        .unwrap();
    assert!(url.contains("test-bucket/test-object.txt"));

    storage
        .delete_object(&conn, "test-bucket", "test-object.txt")
        .await
        .unwrap();
    assert!(matches!(
        storage.download_object(&conn, "test-bucket", "test-object.txt").await,
        Err(ObjectStorageError::NotFound { .. })
    ));

    storage.delete_bucket(&conn, "test-bucket").await.unwrap();
    assert!(!storage.bucket_exists(&conn, "test-bucket").await.unwrap());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_versioning_tags_and_batch_delete() {
    let (storage, conn, _container) = setup().await;
    storage.make_bucket(&conn, "tagged").await.unwrap();

    storage.set_versioning(&conn, "tagged", true).await.unwrap();
    assert!(storage.versioning_enabled(&conn, "tagged").await.unwrap());

    let mut prod = HashMap::new();
    prod.insert("env".to_string(), "prod".to_string());
    storage
        .upload_object(&conn, "tagged", ObjectUpload::new("a.txt", "a").with_tags(prod.clone()))
        .await
        .unwrap();
    storage
        .upload_object(&conn, "tagged", ObjectUpload::new("b.txt", "b"))
        .await
        .unwrap();
    assert_eq!(storage.object_tags(&conn, "tagged", "a.txt").await.unwrap(), prod);

    storage
        .set_object_tags(&conn, "tagged", "b.txt", prod.clone())
        .await
        .unwrap();
    let filter = TagFilter::new(FilterOperator::And).with_tag("env", "prod");
    assert_eq!(storage.filter_objects(&conn, "tagged", &filter).await.unwrap().len(), 2);

    storage
        .delete_objects(&conn, "tagged", &["a.txt".to_string(), "b.txt".to_string()])
        .await
        .unwrap();
    assert!(storage.list_objects(&conn, "tagged", None).await.unwrap().is_empty());
}
