//! Tag retention reconciliation.
//!
//! [`reconcile`] compares an [`Inventory`] with a [`KeepSet`] and decides
//! what a cleanup run may delete. It is a pure function: no I/O, no state,
//! and the same inputs always give the same plan.
//!
//! The one rule that matters: a digest reachable from any kept tag is never
//! scheduled for deletion, whatever other tags it carries. Deleting a package
//! version removes every tag on it, so a deprecated tag that shares its digest
//! with a kept tag is withheld from the version-deletion set and reported in
//! [`DeletionPlan::shared_tags`] instead.
//!
//! "Reachable" includes the manifests an image index lists. A multi-platform
//! push leaves one tagged index plus an untagged version per platform, and
//! those platform versions are kept along with the index.

use crate::digest::Digest;
use crate::inventory::Inventory;
use crate::keep::KeepSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};


/// What a cleanup run may delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    /// Tags that must survive
    pub keep_set: BTreeSet<String>,
    /// Digests referenced by at least one kept tag, directly or through an
    /// image index
    pub kept_digests: BTreeSet<Digest>,
    /// Versions with no tag, safe to delete
    pub untagged_digests: BTreeSet<Digest>,
    /// Tags outside the keep set whose versions may be deleted
    pub deprecated_tags: BTreeSet<String>,
    /// Tags outside the keep set whose digest is also kept; at most the
    /// label may be removed
    pub shared_tags: BTreeSet<String>,
}

impl DeletionPlan {
    /// Returns true if the plan deletes nothing.
    pub fn is_empty(&self) -> bool {
        self.untagged_digests.is_empty()
            && self.deprecated_tags.is_empty()
            && self.shared_tags.is_empty()
    }

    /// Groups deprecated tags by the version they point at.
    ///
    /// Each entry is one version deletion; tags missing from `inventory` are
    /// skipped.
    pub fn deprecated_versions(&self, inventory: &Inventory) -> BTreeMap<Digest, BTreeSet<String>> {
        let mut grouped: BTreeMap<Digest, BTreeSet<String>> = BTreeMap::new();
        for tag in &self.deprecated_tags {
            if let Some(digest) = inventory.digest_of(tag) {
                grouped
                    .entry(digest.clone())
                    .or_default()
                    .insert(tag.clone());
            }
        }
        grouped
    }
}

/// Computes the deletion plan for `inventory` under `keep`.
///
/// # Examples
///
/// ```
/// use libreap::{Digest, Inventory, KeepSet, reconcile};
///
/// let d1: Digest = format!("sha256:{}", "1".repeat(64)).parse().unwrap();
/// let d3: Digest = format!("sha256:{}", "3".repeat(64)).parse().unwrap();
///
/// let mut inventory = Inventory::new();
/// inventory.insert_tag("1.0.0", d1.clone());
/// inventory.insert_tag("old", d3);
///
/// let plan = reconcile(&KeepSet::new(["1.0.0"], Vec::<&str>::new()), &inventory);
/// assert!(plan.deprecated_tags.contains("old"));
/// assert!(plan.kept_digests.contains(&d1));
/// ```
pub fn reconcile(keep: &KeepSet, inventory: &Inventory) -> DeletionPlan {
    let roots = keep.iter().filter_map(|tag| inventory.digest_of(tag));
    let kept_digests = reachable(roots, inventory);

    let untagged_digests: BTreeSet<Digest> = inventory
        .untagged()
        .map(|version| &version.digest)
        .filter(|digest| !kept_digests.contains(*digest))
        .cloned()
        .collect();

    let mut deprecated_tags = BTreeSet::new();
    let mut shared_tags = BTreeSet::new();
    for (tag, digest) in inventory.tags() {
        if keep.contains(tag) {
            continue;
        }
        if kept_digests.contains(digest) {
            shared_tags.insert(tag.to_string());
        } else {
            deprecated_tags.insert(tag.to_string());
        }
    }

    DeletionPlan {
        keep_set: keep.as_set().clone(),
        kept_digests,
        untagged_digests,
        deprecated_tags,
        shared_tags,
    }
}

/// Every digest reachable from `roots` by following index children.
fn reachable<'a>(
    roots: impl Iterator<Item = &'a Digest>,
    inventory: &Inventory,
) -> BTreeSet<Digest> {
    let mut seen = BTreeSet::new();
    let mut pending: Vec<Digest> = roots.cloned().collect();
    while let Some(digest) = pending.pop() {
        if seen.insert(digest.clone()) {
            pending.extend(inventory.children_of(&digest).cloned());
        }
    }
    seen
}
