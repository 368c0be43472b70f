//! Plan execution.
//!
//! [`execute`] turns a [`DeletionPlan`] into backend calls. Calls run one at a
//! time; a failed call is logged and recorded, and the run continues.

use crate::digest::Digest;
use crate::inventory::{Inventory, PackageVersion};
use crate::registry::RegistryBackend;
use crate::retention::DeletionPlan;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};


/// Why a version is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "tags")]
pub enum Reason {
    /// No tag points at the version
    Untagged,
    /// Every tag pointing at the version is deprecated
    Deprecated(BTreeSet<String>),
}

/// One mutation against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum Action {
    DeleteVersion {
        version: PackageVersion,
        reason: Reason,
    },
    /// Label-only removal of a deprecated tag whose version is kept
    RemoveTag { tag: String, digest: Digest },
}

impl Action {
    /// Short target description: the digest or the tag.
    pub fn target(&self) -> String {
        match self {
            Action::DeleteVersion { version, .. } => version.digest.short(),
            Action::RemoveTag { tag, .. } => tag.clone(),
        }
    }
}

/// What happened to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum Outcome {
    Done,
    DryRun,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Report the actions without calling the backend
    pub dry_run: bool,
}

impl CleanupOptions {
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// An action paired with its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    #[serde(flatten)]
    pub action: Action,
    pub outcome: Outcome,
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub backend: String,
    pub dry_run: bool,
    pub results: Vec<ActionResult>,
}

impl CleanupReport {
    fn count(&self, pred: impl Fn(&ActionResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }

    /// Versions deleted (or that would be, in a dry run).
    pub fn deleted_versions(&self) -> usize {
        self.count(|r| {
            matches!(r.action, Action::DeleteVersion { .. })
                && matches!(r.outcome, Outcome::Done | Outcome::DryRun)
        })
    }

    /// Tags removed (or that would be, in a dry run).
    pub fn removed_tags(&self) -> usize {
        self.count(|r| {
            matches!(r.action, Action::RemoveTag { .. })
                && matches!(r.outcome, Outcome::Done | Outcome::DryRun)
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r.outcome, Outcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Lists the actions for `plan`, in execution order: untagged versions,
/// deprecated versions, then shared-tag label removals.
pub fn actions(plan: &DeletionPlan, inventory: &Inventory) -> Vec<Action> {
    let mut actions = Vec::new();

    for digest in &plan.untagged_digests {
        let version = inventory
            .version(digest)
            .cloned()
            .unwrap_or_else(|| PackageVersion::new(digest.clone()));
        actions.push(Action::DeleteVersion {
            version,
            reason: Reason::Untagged,
        });
    }

    for (digest, tags) in plan.deprecated_versions(inventory) {
        if plan.kept_digests.contains(&digest) {
            continue;
        }
        let version = inventory
            .version(&digest)
            .cloned()
            .unwrap_or_else(|| PackageVersion::new(digest.clone()));
        actions.push(Action::DeleteVersion {
            version,
            reason: Reason::Deprecated(tags),
        });
    }

    for tag in &plan.shared_tags {
        if let Some(digest) = inventory.digest_of(tag) {
            actions.push(Action::RemoveTag {
                tag: tag.clone(),
                digest: digest.clone(),
            });
        }
    }

    actions
}

/// Executes `plan` against `backend`.
///
/// Never fails as a whole: each action's error is captured in its
/// [`Outcome`].
pub async fn execute(
    backend: &dyn RegistryBackend,
    inventory: &Inventory,
    plan: &DeletionPlan,
    options: CleanupOptions,
) -> CleanupReport {
    execute_with(backend, inventory, plan, options, |_, _| {}).await
}

/// Like [`execute`], calling `on_result` after each action.
pub async fn execute_with<F>(
    backend: &dyn RegistryBackend,
    inventory: &Inventory,
    plan: &DeletionPlan,
    options: CleanupOptions,
    mut on_result: F,
) -> CleanupReport
where
    F: FnMut(usize, &ActionResult),
{
    let mut report = CleanupReport {
        backend: backend.name().to_string(),
        dry_run: options.dry_run,
        results: Vec::new(),
    };

    for (index, action) in actions(plan, inventory).into_iter().enumerate() {
        let outcome = run_action(backend, &action, options).await;
        let result = ActionResult { action, outcome };
        on_result(index, &result);
        report.results.push(result);
    }

    info!(
        backend = %report.backend,
        deleted = report.deleted_versions(),
        removed = report.removed_tags(),
        skipped = report.skipped(),
        failed = report.failed(),
        dry_run = options.dry_run,
        "cleanup finished"
    );

    report
}

async fn run_action(
    backend: &dyn RegistryBackend,
    action: &Action,
    options: CleanupOptions,
) -> Outcome {
    match action {
        Action::DeleteVersion { version, reason } => {
            if options.dry_run {
                info!(digest = %version.digest, ?reason, "would delete version");
                return Outcome::DryRun;
            }
            match backend.delete_version(version).await {
                Ok(()) => {
                    info!(digest = %version.digest, ?reason, "deleted version");
                    Outcome::Done
                }
                Err(e) => {
                    warn!(digest = %version.digest, error = %e, "version deletion failed");
                    Outcome::Failed(e.to_string())
                }
            }
        }
        Action::RemoveTag { tag, digest } => {
            if !backend.supports_tag_deletion() {
                let reason = format!(
                    "{} shares {} with a kept tag and {} cannot remove single tags",
                    tag,
                    digest.short(),
                    backend.name()
                );
                info!(%tag, "skipping shared tag");
                return Outcome::Skipped(reason);
            }
            if options.dry_run {
                info!(%tag, "would remove tag");
                return Outcome::DryRun;
            }
            match backend.delete_tag(tag).await {
                Ok(()) => {
                    info!(%tag, "removed tag");
                    Outcome::Done
                }
                Err(e) => {
                    warn!(%tag, error = %e, "tag removal failed");
                    Outcome::Failed(e.to_string())
                }
            }
        }
    }
}
