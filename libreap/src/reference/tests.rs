use super::*;
use std::str::FromStr;

#[test]
fn test_reference_accessors() {
    let reference = Reference::from_str("ghcr.io/acme/app").unwrap();
    assert_eq!(reference.registry(), "ghcr.io");
    assert_eq!(reference.repository(), "acme/app");
}

#[test]
fn test_reference_with_port() {
    let reference = Reference::from_str("localhost:5000/team/service").unwrap();
    assert_eq!(reference.registry(), "localhost:5000");
    assert_eq!(reference.repository(), "team/service");
}

#[test]
fn test_reference_display_drops_tag() {
    let reference = Reference::from_str("ghcr.io/acme/app:1.0.0").unwrap();
    assert_eq!(reference.to_string(), "ghcr.io/acme/app");
}

#[test]
fn test_reference_invalid_fails() {
    let reference = Reference::from_str("Invalid-Reference-With-Caps");
    assert!(matches!(
        reference.unwrap_err(),
        ReapError::Validation { .. }
    ));
}

#[test]
fn test_owner_and_package_nested() {
    let reference = Reference::from_str("ghcr.io/acme/tools/app").unwrap();
    let (owner, package) = reference.owner_and_package().unwrap();
    assert_eq!(owner, "acme");
    assert_eq!(package, "tools/app");
}

#[test]
fn test_owner_and_package_requires_owner() {
    let reference = Reference::from_str("localhost:5000/app").unwrap();
    assert!(reference.owner_and_package().is_err());
}
