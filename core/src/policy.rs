//! Retention policy model and validation.
//!
//! A policy file holds a sequence of [`RawPolicy`] entries exactly as they
//! appear in YAML. [`Policy::from_raw`] turns each one into a validated
//! [`Policy`]; nothing downstream ever sees an unvalidated value.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KeepError, Result};

/// Literal that marks every tag as significant.
pub const WILDCARD: &str = "*";

/// `significant_tags` as written in the policy file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTags {
    One(String),
    Many(Vec<String>),
}

/// One policy entry as deserialized from the policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPolicy {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub protected_period: Option<i64>,
    #[serde(default)]
    pub protected_count: Option<i64>,
    #[serde(default)]
    pub significant_tags: Option<RawTags>,
    #[serde(default)]
    pub repositories: Option<Vec<String>>,
    #[serde(default)]
    pub protected_repositories: Option<Vec<String>>,
}

/// Which tags anchor the protection window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificantTags {
    /// Any tag is significant; untagged images never are.
    Any,
    /// Exact, case-sensitive tag names.
    Only(BTreeSet<String>),
}

impl SignificantTags {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, SignificantTags::Any)
    }
}

impl fmt::Display for SignificantTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignificantTags::Any => write!(f, "{}", WILDCARD),
            SignificantTags::Only(tags) => {
                let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
                write!(f, "{}", tags.join(", "))
            }
        }
    }
}

/// A validated retention rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub name: String,
    /// Days after the anchor image during which images are protected
    pub protected_period: u32,
    /// Images retained starting at the anchor, regardless of date
    pub protected_count: usize,
    pub significant_tags: SignificantTags,
    /// Explicit allow-list; `None` means every repository
    pub repositories: Option<BTreeSet<String>>,
    /// Deny-list, wins over the allow-list
    pub protected_repositories: BTreeSet<String>,
}

impl Policy {
    /// Validate a raw policy. `index` is the zero-based position in the
    /// policy file and names the policy when `name` is absent.
    pub fn from_raw(raw: RawPolicy, index: usize) -> Result<Self> {
        let name = match raw.name {
            Some(name) if name.trim().is_empty() => {
                return Err(KeepError::invalid_policy(
                    format!("policy-{}", index + 1),
                    "name",
                    "must not be empty",
                ));
            }
            Some(name) => name,
            None => format!("policy-{}", index + 1),
        };

        let protected_period = non_negative(&name, "protected_period", raw.protected_period)?;
        let protected_period = u32::try_from(protected_period).map_err(|_| {
            KeepError::invalid_policy(&name, "protected_period", "is too large")
        })?;

        let protected_count = non_negative(&name, "protected_count", raw.protected_count)?;
        let protected_count = usize::try_from(protected_count).map_err(|_| {
            KeepError::invalid_policy(&name, "protected_count", "is too large")
        })?;

        let significant_tags = significant_tags(&name, raw.significant_tags)?;

        let repositories = raw
            .repositories
            .map(|names| repository_set(&name, "repositories", names))
            .transpose()?;
        let protected_repositories = raw
            .protected_repositories
            .map(|names| repository_set(&name, "protected_repositories", names))
            .transpose()?
            .unwrap_or_default();

        if let Some(allowed) = &repositories {
            let overlap: Vec<&str> = allowed
                .intersection(&protected_repositories)
                .map(String::as_str)
                .collect();
            if !overlap.is_empty() {
                tracing::debug!(
                    policy = %name,
                    repositories = %overlap.join(", "),
                    "Repositories listed as both allowed and protected; protection wins"
                );
            }
        }

        Ok(Self {
            name,
            protected_period,
            protected_count,
            significant_tags,
            repositories,
            protected_repositories,
        })
    }

    /// Whether this policy evaluates the given repository at all.
    pub fn applies_to(&self, repository: &str) -> bool {
        if self.protected_repositories.contains(repository) {
            return false;
        }
        match &self.repositories {
            Some(allowed) => allowed.contains(repository),
            None => true,
        }
    }

    /// Whether the repository is skipped only because of the deny-list.
    pub fn protects_repository(&self, repository: &str) -> bool {
        self.protected_repositories.contains(repository)
    }
}

fn non_negative(policy: &str, field: &str, value: Option<i64>) -> Result<u64> {
    match value {
        None => Err(KeepError::invalid_policy(policy, field, "is required")),
        Some(v) if v < 0 => Err(KeepError::invalid_policy(
            policy,
            field,
            format!("must not be negative (got {})", v),
        )),
        Some(v) => Ok(v as u64),
    }
}

fn significant_tags(policy: &str, raw: Option<RawTags>) -> Result<SignificantTags> {
    let tags = match raw {
        None => {
            return Err(KeepError::invalid_policy(
                policy,
                "significant_tags",
                "is required",
            ))
        }
        Some(RawTags::One(tag)) if tag == WILDCARD => return Ok(SignificantTags::Any),
        Some(RawTags::One(tag)) => vec![tag],
        Some(RawTags::Many(tags)) if tags.len() == 1 && tags[0] == WILDCARD => {
            return Ok(SignificantTags::Any)
        }
        Some(RawTags::Many(tags)) => tags,
    };

    if tags.is_empty() {
        return Err(KeepError::invalid_policy(
            policy,
            "significant_tags",
            "must not be an empty list",
        ));
    }
    if tags.iter().any(|t| t.is_empty()) {
        return Err(KeepError::invalid_policy(
            policy,
            "significant_tags",
            "must not contain empty tag names",
        ));
    }
    if tags.iter().any(|t| t == WILDCARD) {
        return Err(KeepError::invalid_policy(
            policy,
            "significant_tags",
            "cannot mix `*` with explicit tags",
        ));
    }

    Ok(SignificantTags::Only(tags.into_iter().collect()))
}

fn repository_set(policy: &str, field: &str, names: Vec<String>) -> Result<BTreeSet<String>> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Err(KeepError::invalid_policy(
            policy,
            field,
            "must not contain empty repository names",
        ));
    }
    Ok(names.into_iter().collect())
}
