//! `tagkeep push` command — record an image in the local registry.

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use tagkeep_core::Image;

#[derive(Args)]
pub struct PushArgs {
    /// Repository name
    pub repository: String,

    /// Image digest (e.g. sha256:abc...)
    pub digest: String,

    /// Tag to attach (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Push time in RFC 3339 [default: now]
    #[arg(long)]
    pub pushed_at: Option<DateTime<Utc>>,

    /// Image size in bytes
    #[arg(long, default_value_t = 0)]
    pub size: u64,
}

pub async fn execute(args: PushArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let registry = super::open_registry(registry_dir)?;

    let mut image = Image::new(args.digest, args.pushed_at.unwrap_or_else(Utc::now));
    image.tags.extend(args.tags);
    image.size_bytes = args.size;

    tracing::debug!(
        repository = %args.repository,
        digest = %image.digest,
        "Recording image"
    );
    let digest = image.digest.clone();
    registry.push(&args.repository, image).await?;

    println!("{}@{}", args.repository, digest);
    Ok(())
}
