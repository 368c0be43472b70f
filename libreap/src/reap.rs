//! High-level API for the reap library.
//!
//! [`Reap`] ties an image reference to a registry backend and runs the three
//! steps of a cleanup: fetch the inventory, reconcile it against a keep set,
//! and execute the resulting plan.
//!
//! # Examples
//!
//! ```no_run
//! use libreap::{BackendKind, CleanupOptions, Credentials, KeepSet, Reap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reap = Reap::builder()
//!         .image("ghcr.io/acme/app")
//!         .backend(BackendKind::Github)
//!         .with_credentials(Credentials::from_env())
//!         .build()?;
//!
//!     let keep = KeepSet::new(["1.0.0", "1.1.0"], ["dev"]);
//!     let report = reap.clean(&keep, CleanupOptions::dry_run()).await?;
//!     println!("{} versions would be deleted", report.deleted_versions());
//!     Ok(())
//! }
//! ```

use crate::auth::Credentials;
use crate::cleanup::{self, ActionResult, CleanupOptions, CleanupReport};
use crate::client::{Client, ClientConfig};
use crate::config::{BackendKind, Config};
use crate::error::{ReapError, Result};
use crate::github::GithubPackages;
use crate::inventory::Inventory;
use crate::keep::KeepSet;
use crate::reference::Reference;
use crate::registry::{OciRegistry, RegistryBackend};
use crate::retention::{DeletionPlan, reconcile};
use std::str::FromStr;
use tracing::{debug, info};

/// A cleanup session for one image.
pub struct Reap {
    image: Option<Reference>,
    backend: Box<dyn RegistryBackend>,
}

impl Reap {
    /// Creates a builder for configuring a session.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::Reap;
    ///
    /// let reap = Reap::builder().image("localhost:5000/acme/app").build().unwrap();
    /// assert_eq!(reap.backend_name(), "oci");
    /// ```
    pub fn builder() -> ReapBuilder {
        ReapBuilder::new()
    }

    /// Wraps an existing backend.
    pub fn with_backend(backend: Box<dyn RegistryBackend>) -> Self {
        Self {
            image: None,
            backend,
        }
    }

    /// The target image, when the session was built from a reference.
    pub fn image(&self) -> Option<&Reference> {
        self.image.as_ref()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn supports_tag_deletion(&self) -> bool {
        self.backend.supports_tag_deletion()
    }

    /// Verifies connectivity and credentials.
    pub async fn check(&self) -> Result<()> {
        self.backend.check().await
    }

    /// Fetches the current inventory.
    pub async fn inventory(&self) -> Result<Inventory> {
        let inventory = self.backend.inventory().await?;
        debug!(
            tags = inventory.tag_count(),
            versions = inventory.version_count(),
            "inventory fetched"
        );
        Ok(inventory)
    }

    /// Fetches the inventory and computes what `keep` allows deleting.
    ///
    /// # Errors
    ///
    /// Any query failure is returned and no plan is computed.
    pub async fn plan(&self, keep: &KeepSet) -> Result<(Inventory, DeletionPlan)> {
        let inventory = self.inventory().await?;
        let plan = reconcile(keep, &inventory);
        info!(
            untagged = plan.untagged_digests.len(),
            deprecated = plan.deprecated_tags.len(),
            shared = plan.shared_tags.len(),
            "plan computed"
        );
        Ok((inventory, plan))
    }

    /// Plans and executes in one step.
    pub async fn clean(&self, keep: &KeepSet, options: CleanupOptions) -> Result<CleanupReport> {
        let (inventory, plan) = self.plan(keep).await?;
        Ok(self.execute(&inventory, &plan, options).await)
    }

    /// Executes a previously computed plan.
    pub async fn execute(
        &self,
        inventory: &Inventory,
        plan: &DeletionPlan,
        options: CleanupOptions,
    ) -> CleanupReport {
        cleanup::execute(self.backend.as_ref(), inventory, plan, options).await
    }

    /// Executes a plan, calling `on_result` after each action.
    pub async fn execute_with<F>(
        &self,
        inventory: &Inventory,
        plan: &DeletionPlan,
        options: CleanupOptions,
        on_result: F,
    ) -> CleanupReport
    where
        F: FnMut(usize, &ActionResult),
    {
        cleanup::execute_with(self.backend.as_ref(), inventory, plan, options, on_result).await
    }
}

/// Builder for [`Reap`].
#[derive(Default)]
pub struct ReapBuilder {
    image: Option<String>,
    backend: Option<BackendKind>,
    config: Option<Config>,
    credentials: Option<Credentials>,
}

impl ReapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target image (`registry/owner/package`).
    pub fn image(mut self, image: &str) -> Self {
        self.image = Some(image.to_string());
        self
    }

    /// Selects the backend, overriding `registry.backend` from the config.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Builds the session and its backend.
    ///
    /// # Errors
    ///
    /// Fails when no image is set, the image does not parse, or the
    /// backend cannot be constructed (GitHub needs an owner and a token).
    pub fn build(self) -> Result<Reap> {
        let image = self
            .image
            .ok_or_else(|| ReapError::validation("Image reference is required"))?;
        let reference = Reference::from_str(&image)?;
        let config = self.config.unwrap_or_default();
        let credentials = self.credentials.unwrap_or_default();
        let kind = self.backend.unwrap_or(config.registry.backend);
        let client_config = ClientConfig::from(&config.network);

        let backend: Box<dyn RegistryBackend> = match kind {
            BackendKind::Oci => {
                let client = Client::with_config(
                    reference.registry(),
                    client_config.with_insecure(config.registry.insecure),
                    Some(credentials),
                )?;
                Box::new(
                    OciRegistry::new(client, reference.repository())
                        .with_tag_deletion(config.registry.tag_deletion),
                )
            }
            BackendKind::Github => {
                let (owner, package) = reference.owner_and_package()?;
                let token = credentials.api_token().unwrap_or_default();
                let registry_url = config
                    .github
                    .registry_url
                    .as_deref()
                    .unwrap_or(reference.registry());
                let manifests = Client::with_config(
                    registry_url,
                    client_config.clone(),
                    Some(registry_login(&credentials, owner)),
                )?;
                Box::new(
                    GithubPackages::new(
                        &config.github.api_url,
                        owner,
                        config.github.owner_kind,
                        package,
                        token,
                        client_config,
                    )?
                    .with_manifest_client(manifests, reference.repository()),
                )
            }
        };

        debug!(image = %reference, backend = %kind, "session ready");

        Ok(Reap {
            image: Some(reference),
            backend,
        })
    }
}

/// GHCR exchanges a token for a registry token only over Basic auth; the
/// username is not checked, so the owner is used.
fn registry_login(credentials: &Credentials, owner: &str) -> Credentials {
    match credentials {
        Credentials::Bearer { token } => Credentials::basic(owner, token.clone()),
        other => other.clone(),
    }
}
