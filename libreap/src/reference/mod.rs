//! Target image references.
//!
//! A cleanup run targets one image, named the way it is pulled
//! (`ghcr.io/acme/app`). Parsing is delegated to
//! `oci_spec::distribution::Reference`; any tag or digest in the reference is
//! ignored because the whole repository is reconciled.

use crate::error::{ReapError, Result};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
mod tests;

/// The image whose tags and versions are reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference(OciReference);

impl FromStr for Reference {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_reference = OciReference::from_str(s.trim()).map_err(|e| {
            ReapError::validation_with_source(format!("Invalid image reference '{}'", s), e)
        })?;
        Ok(Reference(oci_reference))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry(), self.repository())
    }
}

impl Reference {
    /// Returns the registry host (and port), e.g. `ghcr.io`.
    pub fn registry(&self) -> &str {
        self.0.registry()
    }

    /// Returns the repository path, e.g. `acme/app`.
    pub fn repository(&self) -> &str {
        self.0.repository()
    }

    /// Splits the repository into `(owner, package)` for package-oriented
    /// registries. `acme/tools/app` yields `("acme", "tools/app")`.
    pub fn owner_and_package(&self) -> Result<(&str, &str)> {
        self.repository()
            .split_once('/')
            .filter(|(owner, package)| !owner.is_empty() && !package.is_empty())
            .ok_or_else(|| {
                ReapError::validation(format!(
                    "Image '{}' has no owner segment (expected <registry>/<owner>/<package>)",
                    self
                ))
            })
    }
}
