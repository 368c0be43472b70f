use super::*;

#[test]
fn test_keep_args_extend_config_values() {
    let mut config = Config::default();
    config.keep.releases = vec!["0.9".to_string()];
    config.keep.extra_tags = vec!["nightly".to_string()];

    let args = KeepArgs {
        releases: vec!["1.0".to_string(), "1.1".to_string()],
        extra_tags: Some("dev, edge".to_string()),
        matrix: Some(PathBuf::from("ci/matrix.json")),
        matrix_key: Some("version".to_string()),
    };
    apply_keep_args(&mut config, &args);

    assert_eq!(config.keep.releases, vec!["0.9", "1.0", "1.1"]);
    assert_eq!(config.keep.extra_tags, vec!["nightly", "dev", "edge"]);
    assert_eq!(config.keep.matrix_file, Some(PathBuf::from("ci/matrix.json")));
    assert_eq!(config.keep.matrix_key, "version");
}

#[test]
fn test_empty_keep_args_leave_config_alone() {
    let mut config = Config::default();
    config.keep.releases = vec!["0.9".to_string()];

    apply_keep_args(&mut config, &KeepArgs::default());

    assert_eq!(config.keep.releases, vec!["0.9"]);
    assert_eq!(config.keep.matrix_key, "release");
}

#[test]
fn test_backend_args_override_config() {
    let mut config = Config::default();
    let args = BackendArgs {
        backend: Some("ghcr".to_string()),
        insecure: true,
        tag_deletion: true,
        owner_kind: Some("user".to_string()),
    };

    apply_backend_args(&mut config, &args).unwrap();

    assert_eq!(config.registry.backend, BackendKind::Github);
    assert!(config.registry.insecure);
    assert!(config.registry.tag_deletion);
    assert_eq!(config.github.owner_kind, OwnerKind::User);
}

#[test]
fn test_backend_args_reject_unknown_backend() {
    let mut config = Config::default();
    let args = BackendArgs {
        backend: Some("quay".to_string()),
        ..Default::default()
    };

    let err = apply_backend_args(&mut config, &args).unwrap_err();
    assert!(err.contains("quay"));
}

#[test]
fn test_resolve_keep_set_from_config() {
    let ctx = AppContext::with_config(Config::default());
    let mut config = Config::default();
    config.keep.releases = vec!["1.0".to_string()];
    config.keep.extra_tags = vec!["dev".to_string()];

    let keep = resolve_keep_set(&ctx, &config).unwrap();
    assert_eq!(keep.len(), 2);
}

#[test]
fn test_resolve_keep_set_bad_matrix() {
    let ctx = AppContext::with_config(Config::default());
    let mut config = Config::default();
    config.keep.matrix_file = Some(PathBuf::from("/nonexistent/matrix.json"));

    assert!(resolve_keep_set(&ctx, &config).is_err());
}

#[test]
fn test_open_session_oci() {
    let reap = open_session(&Config::default(), "localhost:5000/acme/app").unwrap();
    assert_eq!(reap.backend_name(), "oci");
}

#[test]
fn test_open_session_invalid_image() {
    assert!(open_session(&Config::default(), "Invalid-Reference-With-Caps").is_err());
}

#[tokio::test]
async fn test_session_from_flags_plans_against_registry() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/acme/app/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"acme/app","tags":["1.0","old"]}"#)
        .create_async()
        .await;
    for (tag, c) in [("1.0", '1'), ("old", '2')] {
        server
            .mock("HEAD", format!("/v2/acme/app/manifests/{}", tag).as_str())
            .with_status(200)
            .with_header(
                "Docker-Content-Digest",
                &format!("sha256:{}", c.to_string().repeat(64)),
            )
            .create_async()
            .await;
    }

    let ctx = AppContext::with_config(Config::default());
    let mut config = Config::default();
    apply_backend_args(
        &mut config,
        &BackendArgs {
            insecure: true,
            ..Default::default()
        },
    )
    .unwrap();
    apply_keep_args(
        &mut config,
        &KeepArgs {
            releases: vec!["1.0".to_string()],
            ..Default::default()
        },
    );

    let keep = resolve_keep_set(&ctx, &config).unwrap();
    let image = format!("{}/acme/app", server.host_with_port());
    let reap = open_session(&config, &image).unwrap();
    let (_, plan) = reap.plan(&keep).await.unwrap();

    assert_eq!(plan.deprecated_tags.len(), 1);
    assert!(plan.deprecated_tags.contains("old"));
}
