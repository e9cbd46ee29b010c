//! Registry adapters: where inventories come from and deletions go.
//!
//! Adapters expose page-level calls; the provided methods on
//! [`ImageRegistry`] walk the pages so callers always see complete lists.

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;
use tagkeep_core::error::{KeepError, Result};
use tagkeep_core::Image;

pub use local::LocalRegistry;

/// Maximum items per page and per batch delete call.
pub const PAGE_SIZE: usize = 100;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page
    pub next_token: Option<String>,
}

impl<T: Clone> Page<T> {
    /// Serve the page of `items` that starts at `next_token`.
    ///
    /// Tokens are stringified offsets.
    pub fn from_slice(items: &[T], next_token: Option<&str>, scope: &str) -> Result<Self> {
        let start = match next_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| KeepError::RegistryError {
                repository: scope.to_string(),
                message: format!("Invalid pagination token: {}", token),
            })?,
        };
        let start = start.min(items.len());
        let end = start.saturating_add(PAGE_SIZE).min(items.len());

        Ok(Self {
            items: items[start..end].to_vec(),
            next_token: (end < items.len()).then(|| end.to_string()),
        })
    }
}

/// Split a list into API-sized chunks.
pub fn chunks<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.clamp(1, PAGE_SIZE))
}

/// A container registry holding repositories of images.
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// One page of repository names.
    async fn repositories_page(&self, next_token: Option<String>) -> Result<Page<String>>;

    /// One page of images in a repository.
    async fn images_page(&self, repository: &str, next_token: Option<String>)
        -> Result<Page<Image>>;

    /// Delete up to [`PAGE_SIZE`] images by digest; returns the digests
    /// actually deleted.
    async fn batch_delete_images(&self, repository: &str, digests: &[String])
        -> Result<Vec<String>>;

    /// Every repository name.
    async fn list_repositories(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut token = None;
        loop {
            let page = self.repositories_page(token).await?;
            names.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(names)
    }

    /// Resolve an explicit list of repository names, skipping unknown ones.
    async fn describe_repositories(&self, names: &[String]) -> Result<Vec<String>> {
        let known: HashSet<String> = self.list_repositories().await?.into_iter().collect();
        let mut found = Vec::new();
        for name in names {
            if known.contains(name) {
                found.push(name.clone());
            } else {
                tracing::error!(repository = %name, "Repository {} not found!", name);
            }
        }
        Ok(found)
    }

    /// Every image in a repository, in adapter order.
    async fn describe_images(&self, repository: &str) -> Result<Vec<Image>> {
        let mut images = Vec::new();
        let mut token = None;
        loop {
            let page = self.images_page(repository, token).await?;
            images.extend(page.items);
            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(images)
    }
}
