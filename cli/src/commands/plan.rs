//! `tagkeep plan` command — show what a cleanup would do and why.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tagkeep_runtime::{Cleaner, CleanupOptions, FinalAction, NoneInUse, PolicyDecisions};

use crate::output;

#[derive(Args)]
pub struct PlanArgs {
    /// Policy file location
    #[arg(long)]
    pub config: PathBuf,

    /// Output JSON instead of tables
    #[arg(long)]
    pub json: bool,

    /// Only show the final actions
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    policies: &'a [PolicyDecisions],
    actions: &'a [FinalAction],
}

pub async fn execute(args: PlanArgs, registry_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let policies = tagkeep_core::load_policies(&args.config)?;
    let registry = super::open_registry(registry_dir)?;

    let plan = Cleaner::new(&registry, &NoneInUse, CleanupOptions::default())
        .plan(&policies)
        .await?;

    if args.json {
        let out = PlanOutput {
            policies: &plan.per_policy,
            actions: plan.report.actions(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if !args.quiet {
        let mut table =
            output::new_table(&["POLICY", "REPOSITORY", "DIGEST", "TAGS", "VERDICT", "REASON"]);
        for decisions in &plan.per_policy {
            for decision in decisions.decisions() {
                table.add_row(vec![
                    decisions.policy.clone(),
                    decision.repository.clone(),
                    output::short_digest(&decision.digest),
                    output::format_tags(&decision.tags),
                    decision.verdict.to_string(),
                    decision.reason.to_string(),
                ]);
            }
        }
        println!("{table}");
        println!();
    }

    let mut table = output::new_table(&["REPOSITORY", "DIGEST", "TAGS", "ACTION"]);
    for action in plan.report.actions() {
        table.add_row(vec![
            action.repository.clone(),
            output::short_digest(&action.digest),
            output::format_tags(&action.tags),
            action.action.to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "{} to keep, {} to delete",
        plan.report.kept_count(),
        plan.report.deleted_count()
    );

    Ok(())
}
