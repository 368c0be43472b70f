use super::*;
use std::collections::BTreeSet;

const SHA: &str = "sha256:7173b809ca12ec5dee4506cd86be934c4596dd234ee82c0662eac04a8c2c71dc";

#[test]
fn test_digest_from_valid_string_succeeds() {
    let digest = Digest::from_str(SHA).unwrap();
    assert_eq!(digest.algorithm(), "sha256");
    assert!(digest.encoded().starts_with("7173b809"));
    assert_eq!(digest.to_string(), SHA);
}

#[test]
fn test_digest_from_invalid_string_fails() {
    let digest = Digest::from_str("sha256:not-hex");
    assert!(matches!(digest.unwrap_err(), ReapError::Validation { .. }));
}

#[test]
fn test_digest_trims_header_whitespace() {
    let digest = Digest::from_str(&format!(" {} ", SHA)).unwrap();
    assert_eq!(digest.as_str(), SHA);
}

#[test]
fn test_digest_short_form() {
    let digest = Digest::from_str(SHA).unwrap();
    assert_eq!(digest.short(), "sha256:7173b809ca12");
}

#[test]
fn test_digests_dedupe_in_sets() {
    let a = Digest::from_str(SHA).unwrap();
    let b = Digest::from_str(SHA).unwrap();
    let set: BTreeSet<Digest> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_digest_serde_as_plain_string() {
    let digest = Digest::from_str(SHA).unwrap();
    let json = serde_json::to_string(&digest).unwrap();
    assert_eq!(json, format!("\"{}\"", SHA));

    let back: Digest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, digest);

    let bad: std::result::Result<Digest, _> = serde_json::from_str("\"nope\"");
    assert!(bad.is_err());
}
