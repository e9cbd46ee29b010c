//! Disk-backed registry.
//!
//! Keeps repository → image records in an in-memory index backed by a
//! persistent `index.json` under the registry directory. Used as the
//! inventory source and deletion target for offline runs and tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagkeep_core::error::{KeepError, Result};
use tagkeep_core::Image;
use tokio::sync::RwLock;

use super::{ImageRegistry, Page, PAGE_SIZE};

/// Index file name inside the registry directory.
pub const INDEX_FILE: &str = "index.json";

/// Persistent index stored as JSON on disk.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryIndex {
    repositories: BTreeMap<String, Vec<Image>>,
}

/// Registry whose state lives in a single JSON index file.
pub struct LocalRegistry {
    /// Root directory of the registry
    registry_dir: PathBuf,
    /// In-memory index: repository → images
    index: Arc<RwLock<BTreeMap<String, Vec<Image>>>>,
}

impl LocalRegistry {
    /// Open a registry, creating the directory if it doesn't exist and
    /// loading any existing index from disk.
    pub fn open(registry_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(registry_dir).map_err(|e| KeepError::RegistryError {
            repository: String::new(),
            message: format!(
                "Failed to create registry directory {}: {}",
                registry_dir.display(),
                e
            ),
        })?;

        let index = Self::load_index(registry_dir)?;
        Ok(Self {
            registry_dir: registry_dir.to_path_buf(),
            index: Arc::new(RwLock::new(index)),
        })
    }

    /// Record an image in a repository.
    ///
    /// Pushing an existing digest merges its tags. A tag can point at one
    /// digest only, so tags carried by the pushed image are removed from
    /// every other image in the repository.
    pub async fn push(&self, repository: &str, image: Image) -> Result<()> {
        if repository.trim().is_empty() {
            return Err(KeepError::RegistryError {
                repository: repository.to_string(),
                message: "Repository name must not be empty".to_string(),
            });
        }

        let mut index = self.index.write().await;
        let images = index.entry(repository.to_string()).or_default();

        for other in images.iter_mut().filter(|i| i.digest != image.digest) {
            other.tags.retain(|t| !image.tags.contains(t));
        }

        match images.iter_mut().find(|i| i.digest == image.digest) {
            Some(existing) => existing.tags.extend(image.tags),
            None => images.push(image),
        }
        drop(index);

        self.save_index().await
    }

    /// Point `tag` at an existing digest.
    pub async fn tag(&self, repository: &str, digest: &str, tag: &str) -> Result<()> {
        let image = {
            let index = self.index.read().await;
            index
                .get(repository)
                .and_then(|images| images.iter().find(|i| i.digest == digest))
                .cloned()
        };

        match image {
            Some(mut image) => {
                image.tags.clear();
                image.tags.insert(tag.to_string());
                self.push(repository, image).await
            }
            None => Err(KeepError::RegistryError {
                repository: repository.to_string(),
                message: format!("Image not found: {}", digest),
            }),
        }
    }

    /// Drop a repository and all of its images.
    pub async fn remove_repository(&self, repository: &str) -> Result<()> {
        let removed = self.index.write().await.remove(repository).is_some();
        if !removed {
            return Err(KeepError::RegistryError {
                repository: repository.to_string(),
                message: "Repository not found".to_string(),
            });
        }
        self.save_index().await
    }

    /// Number of images in a repository (zero if unknown).
    pub async fn image_count(&self, repository: &str) -> usize {
        let index = self.index.read().await;
        index.get(repository).map_or(0, Vec::len)
    }

    /// Get the registry directory path.
    pub fn registry_dir(&self) -> &Path {
        &self.registry_dir
    }

    /// Load index from disk.
    fn load_index(registry_dir: &Path) -> Result<BTreeMap<String, Vec<Image>>> {
        let index_path = registry_dir.join(INDEX_FILE);
        if !index_path.exists() {
            return Ok(BTreeMap::new());
        }

        let data = std::fs::read_to_string(&index_path).map_err(|e| KeepError::RegistryError {
            repository: String::new(),
            message: format!(
                "Failed to read registry index {}: {}",
                index_path.display(),
                e
            ),
        })?;

        let index: RegistryIndex = serde_json::from_str(&data).map_err(|e| {
            KeepError::RegistryError {
                repository: String::new(),
                message: format!("Failed to parse registry index: {}", e),
            }
        })?;

        Ok(index.repositories)
    }

    /// Save index to disk.
    async fn save_index(&self) -> Result<()> {
        let index = self.index.read().await;
        let registry_index = RegistryIndex {
            repositories: index.clone(),
        };
        drop(index);

        let data = serde_json::to_string_pretty(&registry_index)?;
        let index_path = self.registry_dir.join(INDEX_FILE);

        tokio::fs::write(&index_path, data).await.map_err(|e| {
            KeepError::RegistryError {
                repository: String::new(),
                message: format!(
                    "Failed to write registry index {}: {}",
                    index_path.display(),
                    e
                ),
            }
        })?;

        Ok(())
    }
}

#[async_trait]
impl ImageRegistry for LocalRegistry {
    async fn repositories_page(&self, next_token: Option<String>) -> Result<Page<String>> {
        let index = self.index.read().await;
        let names: Vec<String> = index.keys().cloned().collect();
        Page::from_slice(&names, next_token.as_deref(), "")
    }

    async fn images_page(
        &self,
        repository: &str,
        next_token: Option<String>,
    ) -> Result<Page<Image>> {
        let index = self.index.read().await;
        let images = index.get(repository).ok_or_else(|| KeepError::RegistryError {
            repository: repository.to_string(),
            message: "Repository not found".to_string(),
        })?;
        Page::from_slice(images, next_token.as_deref(), repository)
    }

    async fn batch_delete_images(
        &self,
        repository: &str,
        digests: &[String],
    ) -> Result<Vec<String>> {
        if digests.len() > PAGE_SIZE {
            return Err(KeepError::RegistryError {
                repository: repository.to_string(),
                message: format!(
                    "Cannot delete {} images in one call (limit {})",
                    digests.len(),
                    PAGE_SIZE
                ),
            });
        }

        let mut index = self.index.write().await;
        let images = index
            .get_mut(repository)
            .ok_or_else(|| KeepError::RegistryError {
                repository: repository.to_string(),
                message: "Repository not found".to_string(),
            })?;

        let mut deleted = Vec::new();
        images.retain(|image| {
            if digests.contains(&image.digest) {
                deleted.push(image.digest.clone());
                false
            } else {
                true
            }
        });
        drop(index);

        for missing in digests.iter().filter(|d| !deleted.contains(*d)) {
            tracing::debug!(repository, digest = %missing, "Image already absent");
        }

        self.save_index().await?;
        Ok(deleted)
    }
}
