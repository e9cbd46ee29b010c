//! Tagkeep CLI - tag-aware retention for container image repositories.

pub mod commands;
pub mod logging;
pub mod output;
