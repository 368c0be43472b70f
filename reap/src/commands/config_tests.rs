use super::*;
use crate::format::OutputFormat;
use libreap::config::OwnerKind;
use std::path::PathBuf;

#[test]
fn test_config_format_pretty_defaults() {
    let config = Config::default();
    let output = ConfigView(&config).format_pretty();
    assert!(output.contains("[output]\nformat = pretty\ncolor = auto\n"));
    assert!(output.contains("[registry]\nbackend = oci\n"));
    assert!(output.contains("matrix_key = release"));
    assert!(!output.contains("matrix_file"));
    assert!(!output.contains("registry_url"));
}

#[test]
fn test_config_format_pretty_with_keep_values() {
    let mut config = Config::default();
    config.keep.releases = vec!["1.0".to_string(), "1.1".to_string()];
    config.keep.matrix_file = Some(PathBuf::from("ci/matrix.json"));
    config.github.owner_kind = OwnerKind::User;
    config.github.registry_url = Some("ghcr.example.com".to_string());

    let output = ConfigView(&config).format_pretty();
    assert!(output.contains("registry_url = ghcr.example.com"));
    assert!(output.contains("releases = [1.0, 1.1]"));
    assert!(output.contains("matrix_file = ci/matrix.json"));
    assert!(output.contains("owner_kind = user"));
}

#[test]
fn test_config_view_serializes_like_config() {
    let config = Config::default();
    let view = format::format_output(&ConfigView(&config), OutputFormat::Json).unwrap();
    let direct = serde_json::to_string_pretty(&config).unwrap();
    assert_eq!(view, direct);
}
