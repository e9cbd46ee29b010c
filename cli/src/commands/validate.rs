//! `tagkeep validate` command.

use std::path::PathBuf;

use clap::Args;

use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    /// Policy file location
    #[arg(long)]
    pub config: PathBuf,
}

pub async fn execute(args: ValidateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let policies = tagkeep_core::load_policies(&args.config)?;

    let mut table = output::new_table(&[
        "NAME",
        "PERIOD (DAYS)",
        "COUNT",
        "SIGNIFICANT TAGS",
        "REPOSITORIES",
        "PROTECTED",
    ]);
    for policy in &policies {
        let repositories = match &policy.repositories {
            Some(names) => names.iter().cloned().collect::<Vec<_>>().join(","),
            None => "<all>".to_string(),
        };
        let protected = if policy.protected_repositories.is_empty() {
            "-".to_string()
        } else {
            policy
                .protected_repositories
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",")
        };

        table.add_row(vec![
            policy.name.clone(),
            policy.protected_period.to_string(),
            policy.protected_count.to_string(),
            policy.significant_tags.to_string(),
            repositories,
            protected,
        ]);
    }

    println!("{table}");
    println!("{} policy(ies) OK", policies.len());
    Ok(())
}
