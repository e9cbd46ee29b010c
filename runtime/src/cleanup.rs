//! Cleanup executor: registry → retention engine → deletions.
//!
//! The executor never re-derives policy logic. It fetches inventories,
//! asks [`crate::retention::plan`] for the final actions, and then either
//! prints (dry run) or performs the deletions in registry-sized chunks.

use std::collections::BTreeSet;

use serde::Serialize;
use tagkeep_core::error::{KeepError, Result};
use tagkeep_core::{Image, Inventory, Policy};

use crate::in_use::InUseCheck;
use crate::registry::{chunks, ImageRegistry, PAGE_SIZE};
use crate::retention::{self, DecisionReport, PolicyDecisions};

/// How the executor behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Log what would be deleted without calling the registry
    pub dry_run: bool,
    /// Digests per batch delete call (capped at [`PAGE_SIZE`])
    pub chunk_size: usize,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            chunk_size: PAGE_SIZE,
        }
    }
}

/// Everything computed before any deletion happens.
#[derive(Debug, Clone)]
pub struct CleanupPlan {
    pub inventory: Inventory,
    pub per_policy: Vec<PolicyDecisions>,
    pub report: DecisionReport,
}

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub dry_run: bool,
    pub repositories_scanned: usize,
    pub images_kept: usize,
    /// Deleted images, or images that would be deleted in dry run
    pub images_deleted: usize,
    /// Repositories left untouched because an image was in use
    pub skipped_in_use: Vec<String>,
    /// Registry errors, one per failed batch
    pub errors: Vec<String>,
}

/// Applies retention policies to a registry.
pub struct Cleaner<'a> {
    registry: &'a dyn ImageRegistry,
    in_use: &'a dyn InUseCheck,
    options: CleanupOptions,
}

impl<'a> Cleaner<'a> {
    pub fn new(
        registry: &'a dyn ImageRegistry,
        in_use: &'a dyn InUseCheck,
        options: CleanupOptions,
    ) -> Self {
        Self {
            registry,
            in_use,
            options,
        }
    }

    /// Repositories any policy could touch.
    ///
    /// When every policy carries an allow-list only those names are looked
    /// up; otherwise the whole registry is listed.
    pub async fn resolve_repositories(&self, policies: &[Policy]) -> Result<Vec<String>> {
        let allow_lists: Option<Vec<&BTreeSet<String>>> =
            policies.iter().map(|p| p.repositories.as_ref()).collect();

        match allow_lists {
            Some(lists) if !lists.is_empty() => {
                let names: BTreeSet<String> = lists.into_iter().flatten().cloned().collect();
                let names: Vec<String> = names.into_iter().collect();
                self.registry.describe_repositories(&names).await
            }
            _ => self.registry.list_repositories().await,
        }
    }

    /// Fetch and sort the images of each repository.
    pub async fn load_inventory(&self, repositories: &[String]) -> Result<Inventory> {
        let mut inventory = Inventory::new();
        for repository in repositories {
            let images = self.registry.describe_images(repository).await?;
            tracing::debug!(
                repository = %repository,
                images = images.len(),
                "Fetched repository inventory"
            );
            inventory.insert(repository.clone(), images);
        }
        Ok(inventory)
    }

    /// Evaluate the policies without touching the registry.
    pub async fn plan(&self, policies: &[Policy]) -> Result<CleanupPlan> {
        if policies.is_empty() {
            return Err(KeepError::ConfigError(
                "No policies to apply. Nothing to do.".to_string(),
            ));
        }

        let repositories = self.resolve_repositories(policies).await?;
        if repositories.is_empty() {
            tracing::error!("Unable to get repositories list from the config file. Nothing to do.");
        }

        let inventory = self.load_inventory(&repositories).await?;
        let (per_policy, report) = retention::plan(&inventory, policies);

        Ok(CleanupPlan {
            inventory,
            per_policy,
            report,
        })
    }

    /// Plan and then delete (or, in dry run, print) what the report says.
    pub async fn run(&self, policies: &[Policy]) -> Result<CleanupSummary> {
        let plan = self.plan(policies).await?;
        log_scope(&plan.inventory, policies);

        let mut summary = CleanupSummary {
            dry_run: self.options.dry_run,
            repositories_scanned: plan.inventory.len(),
            images_kept: plan.report.kept_count(),
            ..Default::default()
        };

        let deletable = plan.report.deletable_images(&plan.inventory);
        let covered: BTreeSet<&str> = plan
            .report
            .actions()
            .iter()
            .map(|a| a.repository.as_str())
            .collect();

        for repository in covered {
            match deletable.get(repository) {
                Some(images) => self.flush(repository, images, &mut summary).await,
                None => tracing::info!(
                    repository = %repository,
                    "No images met the requirements of cleaning policy"
                ),
            }
        }

        tracing::info!(
            repositories = summary.repositories_scanned,
            kept = summary.images_kept,
            deleted = summary.images_deleted,
            dry_run = summary.dry_run,
            "Cleanup finished"
        );
        Ok(summary)
    }

    /// Delete one repository's images chunk by chunk.
    ///
    /// An in-use image stops the repository: nothing further is deleted.
    async fn flush(&self, repository: &str, images: &[&Image], summary: &mut CleanupSummary) {
        tracing::info!(
            repository = %repository,
            count = images.len(),
            "Flushing images from `{}`",
            repository
        );

        for chunk in chunks(images, self.options.chunk_size) {
            for image in chunk {
                tracing::info!(
                    "{}, {}, {}",
                    image.short_id(),
                    image.tags_display(),
                    image.pushed_at.format("%d/%m/%Y %H:%M")
                );
                if self.in_use.is_in_use(&image.digest) {
                    let err = KeepError::ImageInUse {
                        repository: repository.to_string(),
                        digest: image.digest.clone(),
                    };
                    tracing::error!("FATAL: {}! Skipping!", err);
                    summary.skipped_in_use.push(repository.to_string());
                    return;
                }
            }

            if self.options.dry_run {
                summary.images_deleted += chunk.len();
                continue;
            }

            let digests: Vec<String> = chunk.iter().map(|i| i.digest.clone()).collect();
            match self.registry.batch_delete_images(repository, &digests).await {
                Ok(deleted) => summary.images_deleted += deleted.len(),
                Err(e) => {
                    tracing::error!(repository = %repository, error = %e, "Batch delete failed");
                    summary.errors.push(format!("{repository}: {e}"));
                }
            }
        }

        if self.options.dry_run {
            tracing::info!("Running in DRY mode. Not removing anything actually.");
        }
    }
}

/// Log which policy covers which repository, in policy order.
fn log_scope(inventory: &Inventory, policies: &[Policy]) {
    for policy in policies {
        for repository in inventory.repositories() {
            if policy.protects_repository(repository) {
                tracing::info!("Skipping `{}` as protected repository", repository);
            } else if policy.applies_to(repository) {
                tracing::info!(
                    "Cleaning up `{}` according to the policy: `{}`",
                    repository,
                    policy.name
                );
            } else {
                tracing::debug!(
                    policy = %policy.name,
                    repository = %repository,
                    "Repository outside policy scope"
                );
            }
        }
    }
}
