//! `tagkeep rmrepo` command.

use std::path::Path;

use clap::Args;

#[derive(Args)]
pub struct RmRepoArgs {
    /// Repositories to remove
    #[arg(required = true)]
    pub repositories: Vec<String>,
}

pub async fn execute(args: RmRepoArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = super::open_registry(registry_dir)?;

    let mut errors: Vec<String> = Vec::new();
    for repository in &args.repositories {
        let count = registry.image_count(repository).await;
        match registry.remove_repository(repository).await {
            Ok(()) => println!("Removed {repository} ({count} image(s))"),
            Err(e) => errors.push(format!("{repository}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = errors.join("\n");
        Err(format!("Failed to remove repository(ies):\n{msg}").into())
    }
}
