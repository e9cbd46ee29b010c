//! `tagkeep clean` command — apply retention policies to the registry.

use std::path::{Path, PathBuf};

use clap::Args;
use tagkeep_runtime::{Cleaner, CleanupOptions, InUseDigests, PAGE_SIZE};

#[derive(Args)]
pub struct CleanArgs {
    /// Policy file location
    #[arg(long)]
    pub config: PathBuf,

    /// Apply changes. Runs in dry mode by default.
    #[arg(long)]
    pub apply: bool,

    /// Digests per delete call
    #[arg(long, default_value_t = PAGE_SIZE)]
    pub chunk_size: usize,
}

pub async fn execute(args: CleanArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    // Invalid policies abort before the registry is touched.
    let policies = tagkeep_core::load_policies(&args.config)?;

    if !args.apply {
        tracing::warn!(
            "WARNING: Running in DRY mode. To make changes effective, run with the --apply option."
        );
    }

    let registry = super::open_registry(registry_dir)?;
    let in_use = InUseDigests::load(registry.registry_dir())?;

    let options = CleanupOptions {
        dry_run: !args.apply,
        chunk_size: args.chunk_size,
    };
    let summary = Cleaner::new(&registry, &in_use, options)
        .run(&policies)
        .await?;

    let verb = if summary.dry_run { "Would remove" } else { "Removed" };
    println!(
        "{} {} image(s), kept {} across {} repositories",
        verb, summary.images_deleted, summary.images_kept, summary.repositories_scanned
    );

    if !summary.skipped_in_use.is_empty() {
        println!(
            "Skipped (image in use): {}",
            summary.skipped_in_use.join(", ")
        );
    }

    if !summary.errors.is_empty() {
        eprintln!("\nErrors:");
        for err in &summary.errors {
            eprintln!("  {err}");
        }
        return Err(format!("{} delete call(s) failed", summary.errors.len()).into());
    }

    Ok(())
}
