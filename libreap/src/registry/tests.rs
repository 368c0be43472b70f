use super::*;
use crate::digest::Digest;
use std::str::FromStr;

const DIGEST_A: &str = "sha256:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const DIGEST_B: &str = "sha256:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

async fn mock_manifest(server: &mut mockito::ServerGuard, tag: &str, digest: &str) -> mockito::Mock {
    server
        .mock("HEAD", format!("/v2/acme/app/manifests/{}", tag).as_str())
        .with_status(200)
        .with_header("Docker-Content-Digest", digest)
        .create_async()
        .await
}

fn registry_for(server: &mockito::ServerGuard) -> OciRegistry {
    let client = Client::new(&server.url(), None).unwrap();
    OciRegistry::new(client, "acme/app")
}

#[test]
fn test_oci_registry_defaults() {
    let client = Client::new("http://localhost:5000", None).unwrap();
    let registry = OciRegistry::new(client, "acme/app");
    assert_eq!(registry.name(), "oci");
    assert_eq!(registry.repository(), "acme/app");
    assert!(!registry.supports_tag_deletion());
}

#[tokio::test]
async fn test_inventory_resolves_every_tag() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":["1.0","latest","old"]}"#)
        .create_async()
        .await;
    mock_manifest(&mut server, "1.0", DIGEST_A).await;
    mock_manifest(&mut server, "latest", DIGEST_A).await;
    mock_manifest(&mut server, "old", DIGEST_B).await;

    let inventory = registry_for(&server).inventory().await.unwrap();

    assert_eq!(inventory.tag_count(), 3);
    assert_eq!(inventory.version_count(), 2);
    let a = Digest::from_str(DIGEST_A).unwrap();
    assert_eq!(inventory.digest_of("latest"), Some(&a));
    assert_eq!(inventory.version(&a).unwrap().tags.len(), 2);
    assert_eq!(inventory.untagged().count(), 0);
}

#[tokio::test]
async fn test_inventory_empty_repository() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":[]}"#)
        .create_async()
        .await;

    let inventory = registry_for(&server).inventory().await.unwrap();
    assert!(inventory.is_empty());
}

#[tokio::test]
async fn test_inventory_fails_when_tag_unresolvable() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":["gone"]}"#)
        .create_async()
        .await;
    server
        .mock("HEAD", "/v2/acme/app/manifests/gone")
        .with_status(404)
        .create_async()
        .await;

    let result = registry_for(&server).inventory().await;
    assert!(matches!(result.unwrap_err(), ReapError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_version_deletes_manifest_by_digest() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", format!("/v2/acme/app/manifests/{}", DIGEST_B).as_str())
        .with_status(202)
        .create_async()
        .await;

    let version = PackageVersion::new(Digest::from_str(DIGEST_B).unwrap()).with_tags(["old"]);
    registry_for(&server).delete_version(&version).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_tag_requires_opt_in() {
    let server = mockito::Server::new_async().await;

    let result = registry_for(&server).delete_tag("old").await;

    match result.unwrap_err() {
        ReapError::Unsupported { backend, .. } => assert_eq!(backend, "oci"),
        other => panic!("Expected Unsupported error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_tag_when_enabled() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/v2/acme/app/manifests/old")
        .with_status(202)
        .create_async()
        .await;

    let registry = registry_for(&server).with_tag_deletion(true);
    registry.delete_tag("old").await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_check_queries_version_and_repository() {
    let mut server = mockito::Server::new_async().await;
    let version = server
        .mock("GET", "/v2/")
        .with_status(200)
        .create_async()
        .await;
    let tags = server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":null}"#)
        .create_async()
        .await;

    registry_for(&server).check().await.unwrap();

    version.assert_async().await;
    tags.assert_async().await;
}

#[tokio::test]
async fn test_inventory_records_index_children() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":["1.0"]}"#)
        .create_async()
        .await;
    server
        .mock("HEAD", "/v2/acme/app/manifests/1.0")
        .with_status(200)
        .with_header("Docker-Content-Digest", DIGEST_A)
        .with_header("Content-Type", "application/vnd.oci.image.index.v1+json")
        .create_async()
        .await;
    let body = format!(
        r#"{{"schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "manifests": [{{"mediaType": "application/vnd.oci.image.manifest.v1+json",
                            "digest": "{}", "size": 512}}]}}"#,
        DIGEST_B
    );
    let index = server
        .mock("GET", format!("/v2/acme/app/manifests/{}", DIGEST_A).as_str())
        .with_status(200)
        .with_header("Content-Type", "application/vnd.oci.image.index.v1+json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await;

    let inventory = registry_for(&server).inventory().await.unwrap();

    index.assert_async().await;
    let a = Digest::from_str(DIGEST_A).unwrap();
    let children: Vec<_> = inventory.children_of(&a).map(|d| d.as_str()).collect();
    assert_eq!(children, vec![DIGEST_B]);
    assert_eq!(inventory.version_count(), 1);
}
