//! Registry inventory: the tags and package versions present for one image.
//!
//! The registry owns the tag -> digest mapping; an [`Inventory`] is a
//! snapshot of it taken at the start of a run, indexed both ways.

use crate::digest::Digest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};


/// A registry-side object identified by digest, carrying zero or more tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageVersion {
    /// Manifest digest
    pub digest: Digest,
    /// Backend identifier used for deletion (GitHub version id); `None` for
    /// registries that delete by digest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tags currently pointing at this digest
    pub tags: BTreeSet<String>,
    /// Creation time, when the backend reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Manifests listed by this version when it is an image index
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub children: BTreeSet<Digest>,
}

impl PackageVersion {
    /// Creates an untagged version with no backend id.
    pub fn new(digest: Digest) -> Self {
        Self {
            digest,
            id: None,
            tags: BTreeSet::new(),
            created_at: None,
            children: BTreeSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_children<I: IntoIterator<Item = Digest>>(mut self, children: I) -> Self {
        self.children.extend(children);
        self
    }

    /// Returns true if no tag points at this version.
    pub fn is_untagged(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Snapshot of an image's tags and versions.
///
/// Invariant: every tag in the tag map is listed in exactly one version's tag
/// set, the version its digest names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    tags: BTreeMap<String, Digest>,
    versions: BTreeMap<Digest, PackageVersion>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points `tag` at `digest`, registering the version if it is new.
    ///
    /// A tag can name one digest only; re-inserting a tag moves it.
    pub fn insert_tag(&mut self, tag: impl Into<String>, digest: Digest) {
        let tag = tag.into();
        if let Some(previous) = self.tags.insert(tag.clone(), digest.clone())
            && previous != digest
            && let Some(version) = self.versions.get_mut(&previous)
        {
            version.tags.remove(&tag);
        }

        self.versions
            .entry(digest.clone())
            .or_insert_with(|| PackageVersion::new(digest))
            .tags
            .insert(tag);
    }

    /// Records a version and every tag it lists.
    ///
    /// Versions with the same digest are merged: the id and timestamp of the
    /// newer record win when present, children accumulate.
    pub fn insert_version(&mut self, version: PackageVersion) {
        let PackageVersion {
            digest,
            id,
            tags,
            created_at,
            children,
        } = version;

        let entry = self
            .versions
            .entry(digest.clone())
            .or_insert_with(|| PackageVersion::new(digest.clone()));
        if id.is_some() {
            entry.id = id;
        }
        if created_at.is_some() {
            entry.created_at = created_at;
        }
        entry.children.extend(children);

        for tag in tags {
            self.insert_tag(tag, digest.clone());
        }
    }

    /// Records the manifests listed by the index `digest`.
    ///
    /// Children need not be versions of their own in the inventory; OCI
    /// registries never list untagged manifests.
    pub fn set_children<I: IntoIterator<Item = Digest>>(&mut self, digest: &Digest, children: I) {
        self.versions
            .entry(digest.clone())
            .or_insert_with(|| PackageVersion::new(digest.clone()))
            .children
            .extend(children);
    }

    /// Returns the manifests the index `digest` lists; empty for plain
    /// manifests and unknown digests.
    pub fn children_of(&self, digest: &Digest) -> impl Iterator<Item = &Digest> {
        self.versions
            .get(digest)
            .into_iter()
            .flat_map(|v| v.children.iter())
    }

    /// Returns the digest `tag` points at.
    pub fn digest_of(&self, tag: &str) -> Option<&Digest> {
        self.tags.get(tag)
    }

    /// Returns the version stored under `digest`.
    pub fn version(&self, digest: &Digest) -> Option<&PackageVersion> {
        self.versions.get(digest)
    }

    /// Iterates over all tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &Digest)> {
        self.tags.iter().map(|(tag, digest)| (tag.as_str(), digest))
    }

    /// Iterates over all versions in digest order.
    pub fn versions(&self) -> impl Iterator<Item = &PackageVersion> {
        self.versions.values()
    }

    /// Iterates over versions no tag points at.
    pub fn untagged(&self) -> impl Iterator<Item = &PackageVersion> {
        self.versions.values().filter(|v| v.is_untagged())
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl FromIterator<PackageVersion> for Inventory {
    fn from_iter<I: IntoIterator<Item = PackageVersion>>(iter: I) -> Self {
        let mut inventory = Self::new();
        for version in iter {
            inventory.insert_version(version);
        }
        inventory
    }
}
