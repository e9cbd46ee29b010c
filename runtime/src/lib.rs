//! Tagkeep Runtime - retention engine and registry cleanup.
//!
//! This crate provides the retention decision engine, the registry
//! adapter trait with its disk-backed implementation, and the executor
//! that turns decisions into (dry-run or real) deletions.

pub mod cleanup;
pub mod in_use;
pub mod registry;
pub mod retention;

// Re-export common types
pub use cleanup::{Cleaner, CleanupOptions, CleanupPlan, CleanupSummary};
pub use in_use::{InUseCheck, InUseDigests, NoneInUse};
pub use registry::{ImageRegistry, LocalRegistry, Page, PAGE_SIZE};
pub use retention::{
    aggregate, evaluate, evaluate_inventory, find_anchor, is_significant, plan, Action, Decision,
    DecisionReport, FinalAction, PolicyDecisions, Reason, Verdict,
};

/// Tagkeep Runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
