use anyhow::Result;
use cliclack::spinner;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::provider_from_env;
use crate::prompt::{print, print_notice, print_status};
use marquee::artifacts::DirectoryArtifactStore;
use marquee::milestones::{MilestoneOutcome, MilestoneTracker};

pub async fn run(artifacts: PathBuf, steps: usize) -> Result<()> {
    let store = Arc::new(DirectoryArtifactStore::new(&artifacts)?);
    let tracker = MilestoneTracker::new(provider_from_env()?, store);
    print_status(&format!("Building from {}", artifacts.join("plan.md").display()));

    let mut history = Vec::new();
    for step in 1..=steps {
        let spin = spinner();
        spin.start(format!("working on step {} of {}", step, steps));

        let outcome = tokio::select! {
            outcome = tracker.advance(&mut history) => outcome,
            _ = tokio::signal::ctrl_c() => {
                spin.stop("");
                print_notice("Interrupted.");
                return Ok(());
            }
        };
        spin.stop("");

        match outcome? {
            MilestoneOutcome::AllComplete(message) => {
                print_notice(&message);
                break;
            }
            MilestoneOutcome::Completed {
                milestone,
                summary,
                marked,
            } => {
                println!("{} {}", style("Milestone:").bold(), milestone);
                print(&summary)?;
                if !marked {
                    print_notice("plan.md changed during this step; the milestone was left as is.");
                }
            }
        }
    }
    Ok(())
}
