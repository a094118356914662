use anyhow::Result;
use clap::Args;

use crate::context::RuntimeContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Repair derived data",
    commands: &[
        "alertmap --backend redis recompute      # Recount every alert, then every user",
    ],
}];

#[derive(Args)]
pub struct RecomputeArgs {}

pub async fn handle_recompute(_args: RecomputeArgs, ctx: &RuntimeContext, output: &OutputManager) -> Result<()> {
    let summary = ctx.persistent_service("recompute").await?.recompute_all().await?;

    output.success(&format!(
        "Recomputed counters for {} alerts and statistics for {} users",
        summary.alerts, summary.users
    ));
    output.display(&summary)
}
