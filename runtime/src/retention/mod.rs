//! Retention decision engine.
//!
//! Pure and synchronous: the inventory goes in already sorted, decisions
//! come out, nothing touches the registry.
//!
//! ```text
//! Policy + images ──► classifier ──► anchor ──► evaluator ──► PolicyDecisions
//!                                                                 │
//!                             all policies ──► report::aggregate ─┘──► DecisionReport
//! ```

pub mod anchor;
pub mod classifier;
pub mod evaluator;
pub mod report;

pub use anchor::{find_anchor, Anchor};
pub use classifier::is_significant;
pub use evaluator::{evaluate, evaluate_inventory, Decision, PolicyDecisions, Reason, Verdict, Window};
pub use report::{aggregate, Action, DecisionReport, FinalAction};

use tagkeep_core::{Inventory, Policy};

/// Evaluate every policy in order and aggregate the result.
pub fn plan(inventory: &Inventory, policies: &[Policy]) -> (Vec<PolicyDecisions>, DecisionReport) {
    let per_policy: Vec<PolicyDecisions> = policies
        .iter()
        .map(|policy| evaluate_inventory(inventory, policy))
        .collect();
    let report = aggregate(&per_policy);
    (per_policy, report)
}
