//! Keep sets: the tags that must survive a cleanup run.

use crate::config::Keep;
use crate::error::Result;
use crate::matrix;
use serde::Serialize;
use std::collections::BTreeSet;


/// Set of tags considered supported.
///
/// Built fresh for every run from the supported release list and the extra
/// tags supplied by the caller. Entries are trimmed; blank entries are
/// ignored. An empty keep set is valid and marks every tag as deprecated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeepSet {
    tags: BTreeSet<String>,
}

impl KeepSet {
    /// Builds the union of supported releases and extra tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use libreap::KeepSet;
    ///
    /// let keep = KeepSet::new(["1.0.0", "1.1.0"], ["dev"]);
    /// assert_eq!(keep.len(), 3);
    /// assert!(keep.contains("dev"));
    /// ```
    pub fn new<R, E, S, T>(releases: R, extra_tags: E) -> Self
    where
        R: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut keep = Self::default();
        keep.extend(releases);
        keep.extend(extra_tags);
        keep
    }

    /// Builds the keep set described by the `keep` config section.
    ///
    /// Releases come from `keep.releases` plus the matrix file, when one is
    /// set. Each `extra_tags` entry may itself be a delimited list.
    ///
    /// # Errors
    ///
    /// Fails when the matrix file cannot be read or parsed.
    pub fn from_config(keep: &Keep) -> Result<Self> {
        let mut releases = keep.releases.clone();
        if let Some(path) = &keep.matrix_file {
            releases.extend(matrix::load_releases(path, &keep.matrix_key)?);
        }
        let extra: Vec<String> = keep
            .extra_tags
            .iter()
            .flat_map(|entry| parse_tag_list(entry))
            .collect();
        Ok(Self::new(releases, extra))
    }

    /// Adds a tag to the set. Returns false for blank or duplicate tags.
    pub fn insert(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.tags.insert(tag.to_string())
    }

    /// Adds every tag from an iterator.
    pub fn extend<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.insert(tag.as_ref());
        }
    }

    /// Returns true if `tag` must be kept.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Iterates over kept tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Returns the underlying set.
    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeepSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keep = Self::default();
        keep.extend(iter);
        keep
    }
}

/// Splits a delimited tag list (`"dev edge,nightly"`) into tags.
///
/// Any mix of ASCII whitespace and commas separates entries. Order of first
/// appearance is kept and duplicates are dropped.
///
/// # Examples
///
/// ```
/// use libreap::keep::parse_tag_list;
///
/// assert_eq!(parse_tag_list("dev, edge\nedge"), vec!["dev", "edge"]);
/// assert!(parse_tag_list("  ").is_empty());
/// ```
pub fn parse_tag_list(input: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    input
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(*tag))
        .map(str::to_string)
        .collect()
}
