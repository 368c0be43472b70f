//! Content digests identifying package versions.
//!
//! Parsing is delegated to `oci_spec::image::Digest`; the validated string is
//! kept so digests can be ordered, hashed and used as set members.

use crate::error::{ReapError, Result};
use oci_spec::image::Digest as OciDigest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// A validated `algorithm:encoded` content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Returns the algorithm part (e.g. `sha256`).
    pub fn algorithm(&self) -> &str {
        self.0.split_once(':').map(|(alg, _)| alg).unwrap_or_default()
    }

    /// Returns the encoded part after the colon.
    pub fn encoded(&self) -> &str {
        self.0.split_once(':').map(|(_, hex)| hex).unwrap_or_default()
    }

    /// Returns the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a shortened form for display, e.g. `sha256:7173b809ca12`.
    pub fn short(&self) -> String {
        let encoded = self.encoded();
        let end = encoded.len().min(12);
        format!("{}:{}", self.algorithm(), &encoded[..end])
    }
}

impl FromStr for Digest {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let oci_digest = OciDigest::from_str(trimmed).map_err(|e| {
            ReapError::validation_with_source(format!("Invalid digest '{}'", trimmed), e)
        })?;
        Ok(Digest(oci_digest.to_string()))
    }
}

impl TryFrom<String> for Digest {
    type Error = ReapError;

    fn try_from(value: String) -> Result<Self> {
        Digest::from_str(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
