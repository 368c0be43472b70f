//! reap - registry tag-retention cleanup library
//!
//! reap decides which container image versions and tags a registry can drop,
//! given the set of tags that must survive (supported releases plus a few
//! moving tags), and optionally performs the deletions.
//!
//! # Quick Start
//!
//! ```no_run
//! use libreap::{CleanupOptions, KeepSet, Reap};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reap = Reap::builder().image("registry.example.com/acme/app").build()?;
//!
//!     let keep = KeepSet::new(["1.0.0", "1.1.0"], ["dev"]);
//!     let (_, plan) = reap.plan(&keep).await?;
//!     for tag in &plan.deprecated_tags {
//!         println!("deprecated: {}", tag);
//!     }
//!
//!     reap.clean(&keep, CleanupOptions::default()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Reap`] - Main entry point: inventory, plan, clean
//! - [`KeepSet`] - Tags that must survive
//! - [`DeletionPlan`] - Output of [`reconcile`]
//! - [`CleanupReport`] - Per-action outcome of a run
//! - [`RegistryBackend`] - Seam between the planner and a registry API
//!
//! The reconciler itself ([`reconcile`]) is a pure function and can be used
//! without any network access.

#![warn(clippy::all)]

/// Returns the libreap crate version.
///
/// # Examples
///
/// ```
/// let version = libreap::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

mod reap;
pub use reap::{Reap, ReapBuilder};

pub use auth::Credentials;
pub use cleanup::{Action, CleanupOptions, CleanupReport, Outcome};
pub use config::{BackendKind, Config};
pub use digest::Digest;
pub use error::{ReapError, Result};
pub use inventory::{Inventory, PackageVersion};
pub use keep::KeepSet;
pub use reference::Reference;
pub use registry::RegistryBackend;
pub use retention::{DeletionPlan, reconcile};

pub mod auth;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod digest;
pub mod error;
pub mod github;
pub mod inventory;
pub mod keep;
pub mod matrix;
pub mod reference;
pub mod registry;
pub mod retention;
