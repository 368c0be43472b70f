use libreap::config::{Github, OwnerKind};
use libreap::{
    BackendKind, CleanupOptions, Config, Credentials, Digest, Inventory, KeepSet, Outcome,
    PackageVersion, Reap, ReapBuilder, ReapError, reconcile,
};

const D1: &str = "sha256:1111111111111111111111111111111111111111111111111111111111111111";
const D2: &str = "sha256:2222222222222222222222222222222222222222222222222222222222222222";
const D3: &str = "sha256:3333333333333333333333333333333333333333333333333333333333333333";
const D4: &str = "sha256:4444444444444444444444444444444444444444444444444444444444444444";

fn digest(s: &str) -> Digest {
    s.parse().unwrap()
}

#[test]
fn test_reconcile_through_public_api() {
    let mut inventory = Inventory::new();
    inventory.insert_tag("1.0.0", digest(D1));
    inventory.insert_tag("1.1.0", digest(D2));
    inventory.insert_tag("dev", digest(D1));
    inventory.insert_tag("old", digest(D3));
    inventory.insert_version(PackageVersion::new(digest(D4)));

    let keep = KeepSet::new(["1.0.0", "1.1.0"], ["dev"]);
    let plan = reconcile(&keep, &inventory);

    assert_eq!(plan.keep_set.len(), 3);
    assert_eq!(plan.kept_digests.len(), 2);
    assert_eq!(plan.deprecated_tags.iter().collect::<Vec<_>>(), vec!["old"]);
    assert_eq!(
        plan.untagged_digests.iter().collect::<Vec<_>>(),
        vec![&digest(D4)]
    );
}

#[test]
fn test_builder_requires_image() {
    let result = ReapBuilder::new().build();
    assert!(matches!(result, Err(ReapError::Validation { .. })));
}

#[test]
fn test_builder_rejects_bad_image() {
    let result = Reap::builder().image("Invalid-Reference-With-Caps").build();
    assert!(result.is_err());
}

#[test]
fn test_builder_github_needs_token() {
    let result = Reap::builder()
        .image("ghcr.io/acme/app")
        .backend(BackendKind::Github)
        .with_credentials(Credentials::anonymous())
        .build();
    assert!(matches!(result, Err(ReapError::Validation { .. })));
}

#[test]
fn test_builder_github_needs_owner() {
    let result = Reap::builder()
        .image("ghcr.io/app")
        .backend(BackendKind::Github)
        .with_credentials(Credentials::bearer("ghs_x"))
        .build();
    assert!(result.is_err());
}

#[test]
fn test_builder_follows_config_backend() {
    let mut config = Config::default();
    config.registry.backend = BackendKind::Github;

    let reap = Reap::builder()
        .image("ghcr.io/acme/app")
        .with_config(config)
        .with_credentials(Credentials::bearer("ghs_x"))
        .build()
        .unwrap();

    assert_eq!(reap.backend_name(), "github");
    assert!(!reap.supports_tag_deletion());
    assert_eq!(reap.image().unwrap().to_string(), "ghcr.io/acme/app");
}

fn oci_config(tag_deletion: bool) -> Config {
    let mut config = Config::default();
    config.registry.insecure = true;
    config.registry.tag_deletion = tag_deletion;
    config
}

fn host_of(server: &mockito::ServerGuard) -> String {
    server.host_with_port()
}

#[tokio::test]
async fn test_oci_clean_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":["1.0.0","dev","old","stale"]}"#)
        .create_async()
        .await;
    for (tag, d) in [("1.0.0", D1), ("dev", D1), ("old", D1), ("stale", D3)] {
        server
            .mock("HEAD", format!("/v2/acme/app/manifests/{}", tag).as_str())
            .with_status(200)
            .with_header("Docker-Content-Digest", d)
            .create_async()
            .await;
    }
    let delete_stale = server
        .mock("DELETE", format!("/v2/acme/app/manifests/{}", D3).as_str())
        .with_status(202)
        .expect(1)
        .create_async()
        .await;
    let delete_old = server
        .mock("DELETE", "/v2/acme/app/manifests/old")
        .with_status(202)
        .expect(1)
        .create_async()
        .await;
    let delete_kept = server
        .mock("DELETE", format!("/v2/acme/app/manifests/{}", D1).as_str())
        .expect(0)
        .create_async()
        .await;

    let reap = Reap::builder()
        .image(&format!("{}/acme/app", host_of(&server)))
        .with_config(oci_config(true))
        .build()
        .unwrap();

    let keep = KeepSet::new(["1.0.0"], ["dev"]);
    let report = reap.clean(&keep, CleanupOptions::default()).await.unwrap();

    delete_stale.assert_async().await;
    delete_old.assert_async().await;
    delete_kept.assert_async().await;
    assert_eq!(report.deleted_versions(), 1);
    assert_eq!(report.removed_tags(), 1);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_oci_plan_fails_on_query_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(401)
        .create_async()
        .await;

    let reap = Reap::builder()
        .image(&format!("{}/acme/app", host_of(&server)))
        .with_config(oci_config(false))
        .build()
        .unwrap();

    let result = reap.plan(&KeepSet::default()).await;
    assert!(matches!(result, Err(ReapError::Authentication { .. })));
}

#[tokio::test]
async fn test_github_dry_run_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        r#"[
            {{"id": 1, "name": "{D1}", "metadata": {{"container": {{"tags": ["1.0.0", "old"]}}}}}},
            {{"id": 2, "name": "{D2}", "metadata": {{"container": {{"tags": ["0.9.0"]}}}}}},
            {{"id": 3, "name": "{D4}", "metadata": {{"container": {{"tags": []}}}}}}
        ]"#
    );
    server
        .mock("GET", "/users/acme/packages/container/app/versions?per_page=100")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;
    let index = format!(
        r#"{{"schemaVersion": 2,
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "manifests": [{{"mediaType": "application/vnd.oci.image.manifest.v1+json",
                            "digest": "{D4}", "size": 500}}]}}"#
    );
    server
        .mock("GET", format!("/v2/acme/app/manifests/{}", D1).as_str())
        .with_status(200)
        .with_header("content-type", "application/vnd.oci.image.index.v1+json")
        .with_body(index)
        .create_async()
        .await;
    server
        .mock("GET", format!("/v2/acme/app/manifests/{}", D2).as_str())
        .with_status(200)
        .with_header("content-type", "application/vnd.oci.image.manifest.v1+json")
        .with_body(r#"{"schemaVersion": 2, "mediaType": "application/vnd.oci.image.manifest.v1+json"}"#)
        .create_async()
        .await;
    let deletes = server
        .mock("DELETE", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut config = Config::default();
    config.github = Github {
        api_url: server.url(),
        owner_kind: OwnerKind::User,
        registry_url: Some(server.url()),
    };

    let reap = Reap::builder()
        .image("ghcr.io/acme/app")
        .backend(BackendKind::Github)
        .with_config(config)
        .with_credentials(Credentials::bearer("ghs_x"))
        .build()
        .unwrap();

    let keep = KeepSet::new(["1.0.0"], Vec::<&str>::new());
    let report = reap.clean(&keep, CleanupOptions::dry_run()).await.unwrap();

    // D4 is a platform manifest of the kept 1.0.0 index
    deletes.assert_async().await;
    assert_eq!(report.deleted_versions(), 1);
    assert_eq!(report.skipped(), 1);
    let skipped: Vec<_> = report
        .results
        .iter()
        .filter(|r| matches!(r.outcome, Outcome::Skipped(_)))
        .map(|r| r.action.target())
        .collect();
    assert_eq!(skipped, vec!["old".to_string()]);
}

#[test]
fn test_library_version() {
    assert!(!libreap::version().is_empty());
}
