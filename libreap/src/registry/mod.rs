//! Registry backends.
//!
//! A [`RegistryBackend`] exposes one image's inventory and the two mutations
//! a cleanup run can perform: deleting a whole version and, where the API
//! allows it, removing a single tag label. Two implementations exist:
//! [`OciRegistry`] for any Distribution v2 registry and
//! [`GithubPackages`](crate::github::GithubPackages) for GitHub Packages.

use crate::client::Client;
use crate::error::{ReapError, Result};
use crate::inventory::{Inventory, PackageVersion};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

#[cfg(test)]
mod tests;

/// Operations a cleanup run needs from a registry.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Short backend name used in logs and reports.
    fn name(&self) -> &str;

    /// Whether [`delete_tag`](Self::delete_tag) can remove a label without
    /// deleting the version behind it.
    fn supports_tag_deletion(&self) -> bool;

    /// Verifies the registry is reachable and the credentials are accepted.
    async fn check(&self) -> Result<()>;

    /// Fetches every tag and version of the target image.
    async fn inventory(&self) -> Result<Inventory>;

    /// Deletes a version. Every tag pointing at it goes with it.
    async fn delete_version(&self, version: &PackageVersion) -> Result<()>;

    /// Removes one tag label, leaving its version in place.
    async fn delete_tag(&self, tag: &str) -> Result<()>;
}

/// Backend for registries implementing the OCI Distribution API.
///
/// The Distribution API only enumerates tags, so the inventory built here
/// never contains untagged versions.
///
/// # Examples
///
/// ```
/// use libreap::client::Client;
/// use libreap::registry::{OciRegistry, RegistryBackend};
///
/// let client = Client::new("http://localhost:5000", None).unwrap();
/// let registry = OciRegistry::new(client, "acme/app").with_tag_deletion(true);
/// assert!(registry.supports_tag_deletion());
/// ```
#[derive(Debug)]
pub struct OciRegistry {
    client: Client,
    repository: String,
    tag_deletion: bool,
}

impl OciRegistry {
    pub fn new(client: Client, repository: impl Into<String>) -> Self {
        Self {
            client,
            repository: repository.into(),
            tag_deletion: false,
        }
    }

    /// Enables label-only tag removal (`DELETE /v2/<name>/manifests/<tag>`).
    pub fn with_tag_deletion(mut self, enabled: bool) -> Self {
        self.tag_deletion = enabled;
        self
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }
}

#[async_trait]
impl RegistryBackend for OciRegistry {
    fn name(&self) -> &str {
        "oci"
    }

    fn supports_tag_deletion(&self) -> bool {
        self.tag_deletion
    }

    async fn check(&self) -> Result<()> {
        let version = self.client.check_version().await?;
        debug!(api_version = ?version.api_version, "registry reachable");
        self.client.fetch_tags(&self.repository).await?;
        Ok(())
    }

    async fn inventory(&self) -> Result<Inventory> {
        let tags = self.client.fetch_tags(&self.repository).await?;
        debug!(repository = %self.repository, count = tags.len(), "resolving tags");

        let mut inventory = Inventory::new();
        let mut indexes = BTreeSet::new();
        for tag in tags {
            let head = self.client.head_manifest(&self.repository, &tag).await?;
            if head.is_index() {
                indexes.insert(head.digest.clone());
            }
            inventory.insert_tag(tag, head.digest);
        }

        for index in indexes {
            let children = self
                .client
                .fetch_index_children(&self.repository, index.as_str())
                .await?;
            debug!(index = %index.short(), count = children.len(), "index children");
            inventory.set_children(&index, children);
        }

        Ok(inventory)
    }

    async fn delete_version(&self, version: &PackageVersion) -> Result<()> {
        self.client
            .delete_manifest(&self.repository, &version.digest)
            .await
    }

    async fn delete_tag(&self, tag: &str) -> Result<()> {
        if !self.tag_deletion {
            return Err(ReapError::unsupported(self.name(), "tag deletion"));
        }
        self.client.delete_tag(&self.repository, tag).await
    }
}
