//! GitHub Packages backend.
//!
//! GHCR images are managed through the GitHub REST API rather than the
//! Distribution API. Versions are listed and deleted by numeric id; a version
//! carries its manifest digest as `name` and its tags under
//! `metadata.container.tags`. Deleting a version removes all of its tags and
//! there is no endpoint for removing a single tag.
//!
//! A multi-platform push shows up as one tagged index version plus one
//! untagged version per platform. The REST API does not say which is which,
//! so the inventory reads each tagged manifest from the registry and records
//! the children of indexes.

use crate::client::{
    Client, ClientConfig, check_response_status, extract_next_link, resolve_link,
    translate_reqwest_error,
};
use crate::config::OwnerKind;
use crate::digest::Digest;
use crate::error::{ReapError, Result};
use crate::inventory::{Inventory, PackageVersion};
use crate::registry::RegistryBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as ReqwestClient;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;


/// Default GitHub REST API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct VersionResponse {
    id: u64,
    name: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<VersionMetadata>,
}

#[derive(Debug, Deserialize)]
struct VersionMetadata {
    #[serde(default)]
    container: Option<ContainerMetadata>,
}

#[derive(Debug, Deserialize)]
struct ContainerMetadata {
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<VersionResponse> for PackageVersion {
    type Error = ReapError;

    fn try_from(response: VersionResponse) -> Result<Self> {
        let digest = Digest::from_str(&response.name)?;
        let tags = response
            .metadata
            .and_then(|m| m.container)
            .map(|c| c.tags)
            .unwrap_or_default();

        let mut version = PackageVersion::new(digest)
            .with_id(response.id.to_string())
            .with_tags(tags);
        if let Some(created_at) = response.created_at {
            version = version.with_created_at(created_at);
        }
        Ok(version)
    }
}

/// Distribution API access to the package's manifests.
#[derive(Debug)]
struct ManifestSource {
    client: Client,
    repository: String,
}

/// A container package hosted on GitHub Packages.
#[derive(Debug)]
pub struct GithubPackages {
    http_client: ReqwestClient,
    api_url: String,
    owner: String,
    owner_kind: OwnerKind,
    package: String,
    token: String,
    timeout_seconds: u64,
    manifests: Option<ManifestSource>,
}

impl GithubPackages {
    /// Creates a backend for `owner/package`.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `token` is empty; the packages API
    /// rejects anonymous requests.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::client::ClientConfig;
    /// use libreap::config::OwnerKind;
    /// use libreap::github::{DEFAULT_API_URL, GithubPackages};
    ///
    /// let backend = GithubPackages::new(
    ///     DEFAULT_API_URL,
    ///     "acme",
    ///     OwnerKind::Org,
    ///     "tools/app",
    ///     "ghs_token",
    ///     ClientConfig::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     backend.package_url(),
    ///     "https://api.github.com/orgs/acme/packages/container/tools%2Fapp"
    /// );
    /// ```
    pub fn new(
        api_url: &str,
        owner: impl Into<String>,
        owner_kind: OwnerKind,
        package: impl Into<String>,
        token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ReapError::validation(
                "GitHub Packages requires a token (set REAP_TOKEN or GITHUB_TOKEN)",
            ));
        }

        Ok(Self {
            http_client: config.build_http_client()?,
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            owner: owner.into(),
            owner_kind,
            package: package.into(),
            token,
            timeout_seconds: config.timeout_seconds,
            manifests: None,
        })
    }

    /// Reads manifests through `client` (the package's registry, usually
    /// `ghcr.io`) under `repository`.
    ///
    /// Without it, [`inventory`](RegistryBackend::inventory) fails for
    /// packages that mix tagged and untagged versions, since untagged
    /// platform manifests cannot be told apart from orphans.
    pub fn with_manifest_client(mut self, client: Client, repository: impl Into<String>) -> Self {
        self.manifests = Some(ManifestSource {
            client,
            repository: repository.into(),
        });
        self
    }

    /// Returns the REST URL of the package.
    pub fn package_url(&self) -> String {
        let owner_path = match self.owner_kind {
            OwnerKind::Org => format!("orgs/{}", self.owner),
            OwnerKind::User => format!("users/{}", self.owner),
            OwnerKind::Authenticated => "user".to_string(),
        };
        format!(
            "{}/{}/packages/container/{}",
            self.api_url,
            owner_path,
            self.package.replace('/', "%2F")
        )
    }

    async fn request(&self, method: reqwest::Method, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .request(method, url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|e| translate_reqwest_error(e, &self.api_url, self.timeout_seconds))?;
        check_response_status(response).await
    }

    /// Lists every version of the package, following pagination.
    pub async fn list_versions(&self) -> Result<Vec<PackageVersion>> {
        let mut versions = Vec::new();
        let mut url = format!("{}/versions?per_page={}", self.package_url(), PAGE_SIZE);

        loop {
            debug!(%url, "listing package versions");
            let response = self.request(reqwest::Method::GET, &url).await?;
            let next = extract_next_link(response.headers());

            let page: Vec<VersionResponse> = response.json().await.map_err(|e| {
                ReapError::validation_with_source("Failed to parse package versions", e)
            })?;
            for entry in page {
                versions.push(PackageVersion::try_from(entry)?);
            }

            match next {
                Some(link) => url = resolve_link(&self.api_url, &link),
                None => break,
            }
        }

        Ok(versions)
    }
}

#[async_trait]
impl RegistryBackend for GithubPackages {
    fn name(&self) -> &str {
        "github"
    }

    fn supports_tag_deletion(&self) -> bool {
        false
    }

    async fn check(&self) -> Result<()> {
        self.request(reqwest::Method::GET, &self.package_url()).await?;
        Ok(())
    }

    async fn inventory(&self) -> Result<Inventory> {
        let mut inventory: Inventory = self.list_versions().await?.into_iter().collect();
        if inventory.untagged().next().is_none() {
            return Ok(inventory);
        }

        let tagged: Vec<Digest> = inventory
            .versions()
            .filter(|v| !v.is_untagged())
            .map(|v| v.digest.clone())
            .collect();
        if tagged.is_empty() {
            return Ok(inventory);
        }

        let source = self.manifests.as_ref().ok_or_else(|| {
            ReapError::validation(format!(
                "{} has untagged versions but no registry to read index manifests from",
                self.package
            ))
        })?;
        for digest in tagged {
            let children = source
                .client
                .fetch_index_children(&source.repository, digest.as_str())
                .await?;
            if !children.is_empty() {
                debug!(index = %digest.short(), count = children.len(), "index children");
                inventory.set_children(&digest, children);
            }
        }

        Ok(inventory)
    }

    async fn delete_version(&self, version: &PackageVersion) -> Result<()> {
        let id = version.id.as_deref().ok_or_else(|| {
            ReapError::validation(format!(
                "Version {} has no package version id",
                version.digest
            ))
        })?;
        let url = format!("{}/versions/{}", self.package_url(), id);
        self.request(reqwest::Method::DELETE, &url).await?;
        Ok(())
    }

    async fn delete_tag(&self, _tag: &str) -> Result<()> {
        Err(ReapError::unsupported(self.name(), "tag deletion"))
    }
}
