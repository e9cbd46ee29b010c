//! `tagkeep images` command.

use std::path::Path;

use clap::Args;
use tagkeep_core::Inventory;
use tagkeep_runtime::ImageRegistry;

use crate::output;

#[derive(Args)]
pub struct ImagesArgs {
    /// Only list this repository
    pub repository: Option<String>,

    /// Only show digests (one per line)
    #[arg(short, long)]
    pub quiet: bool,
}

pub async fn execute(args: ImagesArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = super::open_registry(registry_dir)?;

    let repositories = match args.repository {
        Some(name) => vec![name],
        None => registry.list_repositories().await?,
    };

    let mut inventory = Inventory::new();
    for repository in &repositories {
        inventory.insert(repository.clone(), registry.describe_images(repository).await?);
    }

    if args.quiet {
        for (_, images) in inventory.iter() {
            for image in images {
                println!("{}", image.digest);
            }
        }
        return Ok(());
    }

    let mut table = output::new_table(&["REPOSITORY", "DIGEST", "TAGS", "SIZE", "PUSHED"]);
    for (repository, images) in inventory.iter() {
        for image in images {
            table.add_row(vec![
                repository.to_string(),
                output::short_digest(&image.digest),
                output::format_tags(&image.tags),
                output::format_bytes(image.size_bytes),
                output::format_pushed(&image.pushed_at),
            ]);
        }
    }

    println!("{table}");
    Ok(())
}
