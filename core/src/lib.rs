//! Tagkeep Core - policy model, image inventory, and shared error types.
//!
//! Everything here is plain data plus validation; the retention engine
//! and registry plumbing live in `tagkeep-runtime`.

pub mod config;
pub mod error;
pub mod image;
pub mod log;
pub mod policy;

// Re-export commonly used types
pub use config::{load_policies, parse_policies};
pub use error::{KeepError, Result};
pub use image::{truncate_chars, Image, Inventory};
pub use log::{LogConfig, LogLevel};
pub use policy::{Policy, RawPolicy, RawTags, SignificantTags};

/// Tagkeep version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
