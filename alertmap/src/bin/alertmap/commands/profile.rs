use anyhow::Result;
use clap::Args;

use alertmap::{Store, UserId};

use crate::context::RuntimeContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Inspect a user",
    commands: &[
        "alertmap --backend redis profile Xk3p9QvT2mLr8sYb4NcW",
        "alertmap --backend redis profile Xk3p9QvT2mLr8sYb4NcW --recompute",
    ],
}];

#[derive(Args)]
pub struct ProfileArgs {
    /// User id to show
    pub user_id: String,

    /// Rebuild the statistics before showing them
    #[arg(long)]
    pub recompute: bool,
}

pub async fn handle_profile(args: ProfileArgs, ctx: &RuntimeContext, output: &OutputManager) -> Result<()> {
    let user_id = UserId::from(args.user_id);
    let now = chrono::Utc::now();

    let service = ctx.persistent_service("profile").await?;
    let profile = if args.recompute {
        service.store().recompute_statistics(&user_id, now).await?
    } else {
        service.profile_of(&user_id).await?
    };

    output.heading(&format!("Profile {user_id}"));
    output.display(&profile)
}
