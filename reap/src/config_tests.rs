use super::*;

#[test]
fn test_config_path_ends_with_reap_yaml() {
    let path = get_config_path();
    assert!(path.ends_with("config.yaml"));
}

#[test]
fn test_init_config_writes_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("reap").join("config.yaml");

    init_config(&config_path).unwrap();

    let loaded = Config::from_yaml_str(&fs::read_to_string(&config_path).unwrap()).unwrap();
    assert_eq!(loaded, Config::default());
}

#[test]
fn test_init_config_refuses_existing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "network:\n  timeout: 5\n").unwrap();

    let err = init_config(&config_path).unwrap_err();
    assert!(err.contains("already exists"));
    assert_eq!(
        fs::read_to_string(&config_path).unwrap(),
        "network:\n  timeout: 5\n"
    );
}

#[test]
fn test_get_config_value_scalars() {
    let config = Config::default();
    assert_eq!(get_config_value(&config, "network.timeout").unwrap(), "30");
    assert_eq!(get_config_value(&config, "registry.backend").unwrap(), "oci");
    assert_eq!(get_config_value(&config, "registry.insecure").unwrap(), "false");
    assert_eq!(
        get_config_value(&config, "github.api_url").unwrap(),
        "https://api.github.com"
    );
    assert_eq!(get_config_value(&config, "keep.matrix_file").unwrap(), "");
}

#[test]
fn test_get_config_value_section() {
    let config = Config::default();
    let output = get_config_value(&config, "output").unwrap();
    assert!(output.contains("format: pretty"));
    assert!(output.contains("color: auto"));
}

#[test]
fn test_get_config_value_list() {
    let mut config = Config::default();
    config.keep.releases = vec!["1.0".to_string(), "1.1".to_string()];
    let output = get_config_value(&config, "keep.releases").unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("- ") && lines[0].contains("1.0"));
    assert!(lines[1].contains("1.1"));
}

#[test]
fn test_get_config_value_unknown_key() {
    let config = Config::default();
    let err = get_config_value(&config, "network.nope").unwrap_err();
    assert_eq!(err, "Unknown config key: network.nope");
}
