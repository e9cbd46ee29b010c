//! CLI command definitions and dispatch.

mod clean;
mod images;
mod plan;
mod push;
mod rmrepo;
mod tag;
mod validate;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tagkeep_core::{LogConfig, LogLevel};

/// Tagkeep - retain container images by significant tags.
#[derive(Parser)]
#[command(name = "tagkeep", version, about)]
pub struct Cli {
    /// Registry directory [default: ~/.tagkeep/registry]
    #[arg(long, global = true, env = "TAGKEEP_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// File log level [debug, info, warning, critical, notset]
    #[arg(long, global = true, env = "LOGLEVEL", default_value = "notset")]
    pub loglevel: LogLevel,

    /// Console log level [debug, info, warning, critical, notset]
    #[arg(long, global = true, env = "CONSOLE_LOGLEVEL", default_value = "info")]
    pub console_loglevel: LogLevel,

    /// Directory for the log file
    #[arg(long, global = true, default_value = ".")]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            console_level: self.console_loglevel,
            file_level: self.loglevel,
            log_dir: self.log_dir.clone(),
        }
    }

    /// The registry directory, falling back to the default location.
    pub fn registry_dir(&self) -> PathBuf {
        self.registry.clone().unwrap_or_else(default_registry_dir)
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Apply retention policies (dry run unless --apply)
    Clean(clean::CleanArgs),
    /// Show per-policy decisions and final actions without deleting
    Plan(plan::PlanArgs),
    /// Validate a policy file
    Validate(validate::ValidateArgs),
    /// List images in the registry
    Images(images::ImagesArgs),
    /// Record an image in the registry
    Push(push::PushArgs),
    /// Point a tag at an existing image
    Tag(tag::TagArgs),
    /// Remove repositories and all of their images
    Rmrepo(rmrepo::RmRepoArgs),
}

/// Return the default registry directory (~/.tagkeep/registry).
pub(crate) fn default_registry_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tagkeep"))
        .unwrap_or_else(|| PathBuf::from(".tagkeep"))
        .join("registry")
}

/// Open the registry at `dir`.
pub(crate) fn open_registry(
    dir: &Path,
) -> Result<tagkeep_runtime::LocalRegistry, Box<dyn std::error::Error>> {
    let registry = tagkeep_runtime::LocalRegistry::open(dir)?;
    Ok(registry)
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let registry_dir = cli.registry_dir();
    match cli.command {
        Command::Clean(args) => clean::execute(args, &registry_dir).await,
        Command::Plan(args) => plan::execute(args, &registry_dir).await,
        Command::Validate(args) => validate::execute(args).await,
        Command::Images(args) => images::execute(args, &registry_dir).await,
        Command::Push(args) => push::execute(args, &registry_dir).await,
        Command::Tag(args) => tag::execute(args, &registry_dir).await,
        Command::Rmrepo(args) => rmrepo::execute(args, &registry_dir).await,
    }
}
