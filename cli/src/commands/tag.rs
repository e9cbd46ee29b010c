//! `tagkeep tag` command — point a tag at an image already in the registry.

use std::path::Path;

use clap::Args;

#[derive(Args)]
pub struct TagArgs {
    /// Repository name
    pub repository: String,

    /// Digest of the image to tag
    pub digest: String,

    /// Tag to attach; it is moved off any other image in the repository
    pub tag: String,
}

pub async fn execute(args: TagArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = super::open_registry(registry_dir)?;
    registry.tag(&args.repository, &args.digest, &args.tag).await?;

    println!("{}:{}", args.repository, args.tag);
    Ok(())
}
