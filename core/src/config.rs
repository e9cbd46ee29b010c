//! Policy file loading.
//!
//! The policy file is a YAML sequence; each entry is one retention policy:
//!
//! ```yaml
//! - name: releases
//!   protected_period: 30
//!   protected_count: 10
//!   significant_tags: [prod, rc]
//!   protected_repositories: [base-images]
//! - name: everything-else
//!   protected_period: 7
//!   protected_count: 3
//!   significant_tags: '*'
//! ```

use std::path::Path;

use crate::error::{KeepError, Result};
use crate::policy::{Policy, RawPolicy};

/// Parse and validate every policy in a YAML document.
///
/// Validation is all-or-nothing: the first invalid policy aborts the
/// whole load.
pub fn parse_policies(yaml: &str) -> Result<Vec<Policy>> {
    let raw: Vec<RawPolicy> = if yaml.trim().is_empty() {
        Vec::new()
    } else {
        let parsed: Option<Vec<RawPolicy>> = serde_yaml::from_str(yaml)?;
        parsed.unwrap_or_default()
    };

    if raw.is_empty() {
        return Err(KeepError::ConfigError(
            "Policy file defines no policies. Nothing to do.".to_string(),
        ));
    }

    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| Policy::from_raw(raw, index))
        .collect()
}

/// Read a policy file from disk and validate it.
pub fn load_policies(path: &Path) -> Result<Vec<Policy>> {
    if !path.exists() {
        return Err(KeepError::ConfigError(format!(
            "Policy file {} doesn't exist",
            path.display()
        )));
    }

    let data = std::fs::read_to_string(path).map_err(|e| {
        KeepError::ConfigError(format!(
            "Failed to read policy file {}: {}",
            path.display(),
            e
        ))
    })?;

    let policies = parse_policies(&data)?;
    tracing::debug!(
        path = %path.display(),
        count = policies.len(),
        "Loaded retention policies"
    );
    Ok(policies)
}
