//! Per-policy retention evaluation.
//!
//! For one repository and one policy every image gets exactly one
//! [`Decision`]:
//!
//! 1. images inside `[anchor, anchor + protected_period days]` are protected
//!    (`within-period`);
//! 2. `protected_count` images starting at the anchor (or at the oldest
//!    image when there is no anchor) are protected (`within-count`); when
//!    fewer images follow the anchor, the run backfills towards older
//!    images so `min(protected_count, len)` images are always kept;
//! 3. everything else is deletable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tagkeep_core::{Image, Inventory, Policy};

use super::anchor::find_anchor;

/// Outcome for one image under one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Protect,
    Delete,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protect => write!(f, "protect"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Why a verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    WithinPeriod,
    WithinCount,
    /// Deletable, and the policy found no anchor in this repository
    NoSignificantTagFound,
    OutsideWindow,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WithinPeriod => write!(f, "within-period"),
            Self::WithinCount => write!(f, "within-count"),
            Self::NoSignificantTagFound => write!(f, "no-significant-tag-found"),
            Self::OutsideWindow => write!(f, "outside-window"),
        }
    }
}

/// Verdict for one image under one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub repository: String,
    pub digest: String,
    pub tags: BTreeSet<String>,
    pub verdict: Verdict,
    pub reason: Reason,
}

impl Decision {
    pub fn is_protected(&self) -> bool {
        self.verdict == Verdict::Protect
    }
}

/// All decisions one policy produced over an inventory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyDecisions {
    pub policy: String,
    /// Repository → decisions in inventory order; only in-scope repositories
    pub repositories: BTreeMap<String, Vec<Decision>>,
    /// Repositories skipped by the scope predicate
    pub skipped: Vec<String>,
}

impl PolicyDecisions {
    /// Decisions for a repository, if the policy covered it.
    pub fn get(&self, repository: &str) -> Option<&[Decision]> {
        self.repositories.get(repository).map(Vec::as_slice)
    }

    pub fn decisions(&self) -> impl Iterator<Item = &Decision> {
        self.repositories.values().flatten()
    }
}

/// The inclusive protection window opened by an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    /// `None` when the end overflows the calendar
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, protected_period: u32) -> Self {
        let end = start.checked_add_signed(Duration::days(i64::from(protected_period)));
        Self { start, end }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at <= end)
    }
}

/// Evaluate one policy against one repository's images (oldest first).
pub fn evaluate(repository: &str, images: &[Image], policy: &Policy) -> Vec<Decision> {
    let anchor = find_anchor(images, policy);
    let window = anchor.map(|a| Window::new(a.image.pushed_at, policy.protected_period));

    // Backfill towards older images when fewer than `protected_count`
    // images follow the anchor.
    let count_start = anchor
        .map_or(0, |a| a.index)
        .min(images.len().saturating_sub(policy.protected_count));
    let count_end = count_start.saturating_add(policy.protected_count).min(images.len());
    let by_count = count_start..count_end;

    let unprotected = if anchor.is_some() {
        Reason::OutsideWindow
    } else {
        Reason::NoSignificantTagFound
    };

    images
        .iter()
        .enumerate()
        .map(|(index, image)| {
            let (verdict, reason) = if window.is_some_and(|w| w.contains(image.pushed_at)) {
                (Verdict::Protect, Reason::WithinPeriod)
            } else if by_count.contains(&index) {
                (Verdict::Protect, Reason::WithinCount)
            } else {
                (Verdict::Delete, unprotected)
            };

            Decision {
                repository: repository.to_string(),
                digest: image.digest.clone(),
                tags: image.tags.clone(),
                verdict,
                reason,
            }
        })
        .collect()
}

/// Evaluate one policy against every repository it applies to.
pub fn evaluate_inventory(inventory: &Inventory, policy: &Policy) -> PolicyDecisions {
    let mut result = PolicyDecisions {
        policy: policy.name.clone(),
        ..Default::default()
    };

    for (repository, images) in inventory.iter() {
        if !policy.applies_to(repository) {
            result.skipped.push(repository.to_string());
            continue;
        }
        result
            .repositories
            .insert(repository.to_string(), evaluate(repository, images, policy));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tagkeep_core::{RawPolicy, RawTags};

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
    }

    fn policy(period: i64, count: i64, tags: &[&str]) -> Policy {
        Policy::from_raw(
            RawPolicy {
                name: Some("test".to_string()),
                protected_period: Some(period),
                protected_count: Some(count),
                significant_tags: Some(RawTags::Many(tags.iter().map(|t| t.to_string()).collect())),
                ..Default::default()
            },
            0,
        )
        .unwrap()
    }

    fn images(days: &[i64]) -> Vec<Image> {
        days.iter()
            .map(|d| Image::new(format!("sha256:{d:03}"), at(*d)))
            .collect()
    }

    fn protected(decisions: &[Decision]) -> Vec<&str> {
        decisions
            .iter()
            .filter(|d| d.is_protected())
            .map(|d| d.digest.as_str())
            .collect()
    }

    #[test]
    fn test_empty_inventory_yields_no_decisions() {
        assert!(evaluate("web", &[], &policy(10, 3, &["prod"])).is_empty());
    }

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let mut imgs = images(&[0, 5, 10, 11]);
        imgs[0].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(10, 0, &["prod"]));
        assert_eq!(protected(&decisions), vec!["sha256:000", "sha256:005", "sha256:010"]);
        assert_eq!(decisions[3].reason, Reason::OutsideWindow);
    }

    #[test]
    fn test_period_zero_protects_only_anchor() {
        let mut imgs = images(&[0, 1, 2]);
        imgs[1].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(0, 0, &["prod"]));
        assert_eq!(protected(&decisions), vec!["sha256:001"]);
        assert_eq!(decisions[1].reason, Reason::WithinPeriod);
    }

    #[test]
    fn test_count_starts_at_anchor() {
        let mut imgs = images(&[0, 100, 200, 300, 400]);
        imgs[1].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(0, 3, &["prod"]));
        assert_eq!(
            protected(&decisions),
            vec!["sha256:100", "sha256:200", "sha256:300"]
        );
        assert_eq!(decisions[1].reason, Reason::WithinPeriod);
        assert_eq!(decisions[2].reason, Reason::WithinCount);
        assert_eq!(decisions[0].reason, Reason::OutsideWindow);
    }

    #[test]
    fn test_images_older_than_anchor_are_deletable() {
        let mut imgs = images(&[0, 1, 2]);
        imgs[2].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(365, 1, &["prod"]));
        assert_eq!(protected(&decisions), vec!["sha256:002"]);
    }

    #[test]
    fn test_no_anchor_counts_from_oldest() {
        let decisions = evaluate("web", &images(&[0, 1, 2, 3, 4]), &policy(30, 3, &["prod"]));
        assert_eq!(
            protected(&decisions),
            vec!["sha256:000", "sha256:001", "sha256:002"]
        );
        assert!(decisions[..3].iter().all(|d| d.reason == Reason::WithinCount));
        assert!(decisions[3..]
            .iter()
            .all(|d| d.reason == Reason::NoSignificantTagFound));
    }

    #[test]
    fn test_count_larger_than_inventory() {
        let decisions = evaluate("web", &images(&[0, 1, 2]), &policy(0, 50, &["prod"]));
        assert!(decisions.iter().all(Decision::is_protected));
    }

    #[test]
    fn test_count_does_not_overflow() {
        let mut p = policy(0, 0, &["prod"]);
        p.protected_count = usize::MAX;
        let mut imgs = images(&[0, 1]);
        imgs[1].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &p);
        assert!(decisions.iter().all(Decision::is_protected));
    }

    #[test]
    fn test_count_backfills_before_late_anchor() {
        let mut imgs = images(&[0, 10, 20, 30, 40, 50, 60]);
        imgs[2].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(0, 7, &["prod"]));
        assert!(decisions.iter().all(Decision::is_protected));

        let mut imgs = images(&[0, 1, 2, 3, 4]);
        imgs[4].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(0, 3, &["prod"]));
        assert_eq!(
            protected(&decisions),
            vec!["sha256:002", "sha256:003", "sha256:004"]
        );
        assert_eq!(decisions[2].reason, Reason::WithinCount);
        assert_eq!(decisions[4].reason, Reason::WithinPeriod);
        assert_eq!(decisions[1].reason, Reason::OutsideWindow);
    }

    #[test]
    fn test_decision_carries_repository_and_tags() {
        let mut imgs = images(&[0]);
        imgs[0].tags.insert("prod".to_string());

        let decisions = evaluate("web", &imgs, &policy(0, 0, &["prod"]));
        assert_eq!(decisions[0].repository, "web");
        assert!(decisions[0].tags.contains("prod"));
    }

    #[test]
    fn test_window_contains() {
        let window = Window::new(at(10), 5);
        assert!(!window.contains(at(9)));
        assert!(window.contains(at(10)));
        assert!(window.contains(at(15)));
        assert!(!window.contains(at(15) + Duration::seconds(1)));
    }

    #[test]
    fn test_window_end_overflow_is_unbounded() {
        let window = Window::new(DateTime::<Utc>::MAX_UTC - Duration::days(1), u32::MAX);
        assert!(window.end.is_none());
        assert!(window.contains(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn test_evaluate_inventory_respects_scope() {
        let mut inventory = Inventory::new();
        inventory.insert("web", images(&[0, 1]));
        inventory.insert("base", images(&[0]));

        let mut p = policy(0, 1, &["prod"]);
        p.protected_repositories.insert("base".to_string());

        let result = evaluate_inventory(&inventory, &p);
        assert_eq!(result.policy, "test");
        assert!(result.get("base").is_none());
        assert_eq!(result.get("web").unwrap().len(), 2);
        assert_eq!(result.skipped, vec!["base".to_string()]);
    }

    #[test]
    fn test_reason_display_matches_serde() {
        for reason in [
            Reason::WithinPeriod,
            Reason::WithinCount,
            Reason::NoSignificantTagFound,
            Reason::OutsideWindow,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason));
        }
    }
}
