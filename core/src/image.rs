//! Image records and the per-repository inventory.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One image version in a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Content digest (e.g., "sha256:abc123..."), unique within a repository
    pub digest: String,
    /// Tags pointing at this digest; empty means untagged
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// When the image was pushed to the registry
    pub pushed_at: DateTime<Utc>,
    /// Total size in bytes, informational only
    #[serde(default)]
    pub size_bytes: u64,
}

impl Image {
    pub fn new(digest: impl Into<String>, pushed_at: DateTime<Utc>) -> Self {
        Self {
            digest: digest.into(),
            tags: BTreeSet::new(),
            pushed_at,
            size_bytes: 0,
        }
    }

    /// Builder-style helper adding a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// First 12 hex characters of the digest, without the algorithm prefix.
    pub fn short_id(&self) -> &str {
        let hex = self
            .digest
            .split_once(':')
            .map(|(_, hex)| hex)
            .unwrap_or(&self.digest);
        truncate_chars(hex, 12)
    }

    /// Tags joined by ", ", or "untagged".
    pub fn tags_display(&self) -> String {
        if self.tags.is_empty() {
            "untagged".to_string()
        } else {
            self.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

/// At most `max` leading characters of `s`, split on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(end, _)| &s[..end])
}

/// Inventory ordering: oldest push first, digest breaks ties.
pub fn push_order(a: &Image, b: &Image) -> Ordering {
    a.pushed_at
        .cmp(&b.pushed_at)
        .then_with(|| a.digest.cmp(&b.digest))
}

/// Repository name → images sorted ascending by `pushed_at`.
///
/// Every insertion re-establishes the ordering, so consumers can rely on
/// `images()` being sorted without checking.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    repositories: BTreeMap<String, Vec<Image>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) the images of one repository.
    ///
    /// Duplicate digests are collapsed; their tag sets are merged and the
    /// earliest push time is kept.
    pub fn insert(&mut self, repository: impl Into<String>, images: Vec<Image>) {
        let mut by_digest: BTreeMap<String, Image> = BTreeMap::new();
        for image in images {
            match by_digest.get_mut(&image.digest) {
                Some(existing) => {
                    existing.tags.extend(image.tags);
                    if image.pushed_at < existing.pushed_at {
                        existing.pushed_at = image.pushed_at;
                    }
                }
                None => {
                    by_digest.insert(image.digest.clone(), image);
                }
            }
        }

        let mut images: Vec<Image> = by_digest.into_values().collect();
        images.sort_by(push_order);
        self.repositories.insert(repository.into(), images);
    }

    /// Images of a repository, oldest first. Unknown repositories are empty.
    pub fn images(&self, repository: &str) -> &[Image] {
        self.repositories
            .get(repository)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Repository names in lexicographic order.
    pub fn repositories(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }

    /// (repository, images) pairs in lexicographic repository order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Image])> {
        self.repositories
            .iter()
            .map(|(name, images)| (name.as_str(), images.as_slice()))
    }

    pub fn contains(&self, repository: &str) -> bool {
        self.repositories.contains_key(repository)
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Total number of images across all repositories.
    pub fn image_count(&self) -> usize {
        self.repositories.values().map(Vec::len).sum()
    }
}
