//! Folding per-policy decisions into one final action per image.
//!
//! An image is deleted only when every policy covering its repository
//! marks it deletable; a single protecting policy keeps it. The fold is a
//! set union of protected digests, so the outcome does not depend on the
//! order of the policies.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tagkeep_core::{Image, Inventory};

use super::evaluator::PolicyDecisions;

/// What the executor does with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Keep,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => write!(f, "keep"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Final action for one image after all policies were applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAction {
    pub repository: String,
    pub digest: String,
    pub tags: BTreeSet<String>,
    pub action: Action,
}

/// Ordered final actions: repository name, then inventory order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionReport {
    actions: Vec<FinalAction>,
}

impl DecisionReport {
    pub fn actions(&self) -> &[FinalAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Digests to delete, grouped by repository in inventory order.
    pub fn to_delete(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for action in self.actions.iter().filter(|a| a.action == Action::Delete) {
            grouped
                .entry(action.repository.as_str())
                .or_default()
                .push(action.digest.as_str());
        }
        grouped
    }

    /// Images of `inventory` that the report marks for deletion, per
    /// repository and in push order.
    pub fn deletable_images<'a>(&self, inventory: &'a Inventory) -> BTreeMap<String, Vec<&'a Image>> {
        let doomed: HashSet<(&str, &str)> = self
            .actions
            .iter()
            .filter(|a| a.action == Action::Delete)
            .map(|a| (a.repository.as_str(), a.digest.as_str()))
            .collect();

        let mut grouped = BTreeMap::new();
        for (repository, images) in inventory.iter() {
            let selected: Vec<&Image> = images
                .iter()
                .filter(|img| doomed.contains(&(repository, img.digest.as_str())))
                .collect();
            if !selected.is_empty() {
                grouped.insert(repository.to_string(), selected);
            }
        }
        grouped
    }

    pub fn kept_count(&self) -> usize {
        self.count(Action::Keep)
    }

    pub fn deleted_count(&self) -> usize {
        self.count(Action::Delete)
    }

    fn count(&self, action: Action) -> usize {
        self.actions.iter().filter(|a| a.action == action).count()
    }
}

/// Combine the decisions of every policy, in the order given.
///
/// Repositories that no policy covered get no final action.
pub fn aggregate(per_policy: &[PolicyDecisions]) -> DecisionReport {
    // Repository → first-seen image order plus the union of protected digests.
    struct Fold<'a> {
        order: Vec<(&'a str, &'a BTreeSet<String>)>,
        seen: HashSet<&'a str>,
        protected: HashSet<&'a str>,
    }

    let mut folds: BTreeMap<&str, Fold<'_>> = BTreeMap::new();

    for decisions in per_policy {
        for (repository, repo_decisions) in &decisions.repositories {
            let fold = folds.entry(repository.as_str()).or_insert_with(|| Fold {
                order: Vec::new(),
                seen: HashSet::new(),
                protected: HashSet::new(),
            });

            for decision in repo_decisions {
                if fold.seen.insert(decision.digest.as_str()) {
                    fold.order.push((decision.digest.as_str(), &decision.tags));
                }
                if decision.is_protected() {
                    fold.protected.insert(decision.digest.as_str());
                }
            }
        }
    }

    let actions = folds
        .into_iter()
        .flat_map(|(repository, fold)| {
            let protected = fold.protected;
            fold.order.into_iter().map(move |(digest, tags)| FinalAction {
                repository: repository.to_string(),
                digest: digest.to_string(),
                tags: tags.clone(),
                action: if protected.contains(digest) {
                    Action::Keep
                } else {
                    Action::Delete
                },
            })
        })
        .collect();

    DecisionReport { actions }
}
