//! Guard against deleting images that running workloads still reference.

use std::collections::HashSet;
use std::path::Path;

use tagkeep_core::error::{KeepError, Result};

/// File in the registry directory listing digests currently in use.
pub const IN_USE_FILE: &str = "in-use.json";

/// Answers whether a digest is referenced by something running.
pub trait InUseCheck: Send + Sync {
    fn is_in_use(&self, digest: &str) -> bool;
}

/// Nothing is ever in use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneInUse;

impl InUseCheck for NoneInUse {
    fn is_in_use(&self, _digest: &str) -> bool {
        false
    }
}

/// A fixed set of in-use digests.
#[derive(Debug, Clone, Default)]
pub struct InUseDigests {
    digests: HashSet<String>,
}

impl InUseDigests {
    pub fn new<I, S>(digests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            digests: digests.into_iter().map(Into::into).collect(),
        }
    }

    /// Load the in-use list (a JSON array of digests) from `dir`.
    ///
    /// A missing file means nothing is in use.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(IN_USE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(&path).map_err(|e| {
            KeepError::ConfigError(format!(
                "Failed to read in-use list {}: {}",
                path.display(),
                e
            ))
        })?;
        let digests: Vec<String> = serde_json::from_str(&data)?;

        tracing::debug!(count = digests.len(), "Loaded in-use image digests");
        Ok(Self::new(digests))
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl InUseCheck for InUseDigests {
    fn is_in_use(&self, digest: &str) -> bool {
        self.digests.contains(digest)
    }
}
