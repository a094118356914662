use anyhow::Result;
use clap::Args;
use comfy_table::Cell;

use alertmap::{AppConfig, StorageBackend};

use crate::context::RuntimeContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, add_table_header, create_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Configuration",
    commands: &[
        "alertmap --config alertmap.toml check-config",
        "alertmap --backend redis check-config --ping   # Also verify Redis is reachable",
    ],
}];

#[derive(Args)]
pub struct CheckConfigArgs {
    /// Connect to Redis and issue a PING when the redis backend is selected
    #[arg(long)]
    pub ping: bool,
}

impl TableDisplay for AppConfig {
    fn to_table(&self, options: &GlobalOptions) -> comfy_table::Table {
        let mut table = create_table(options);
        add_table_header(&mut table, options, &["Setting", "Value"]);
        table.add_row(vec![Cell::new("server.bind"), Cell::new(&self.server.bind)]);
        table.add_row(vec![Cell::new("storage.backend"), Cell::new(self.storage.backend)]);
        table.add_row(vec![Cell::new("storage.redis_url"), Cell::new(&self.storage.redis_url)]);
        table.add_row(vec![Cell::new("storage.prefix"), Cell::new(&self.storage.prefix)]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "bind={} backend={} prefix={}",
            self.server.bind, self.storage.backend, self.storage.prefix
        )
    }
}

pub async fn handle_check_config(args: CheckConfigArgs, ctx: &RuntimeContext, output: &OutputManager) -> Result<()> {
    match &ctx.config_path {
        Some(path) => output.verbose(&format!("Loaded {}", path.display())),
        None => output.verbose("No config file given, using defaults"),
    }

    output.heading("Effective configuration");
    output.display(&ctx.config)?;

    ctx.config.bind_address()?;
    if ctx.backend() == StorageBackend::Redis {
        let url = ctx.config.storage.redis_url()?;
        output.info(&format!("Redis URL resolves to {url}"));
        if args.ping {
            let store = ctx.redis_store().await?;
            let mut conn = store.connection();
            let pong: String = alertmap::redis::cmd("PING").query_async(&mut conn).await?;
            output.success(&format!("Redis answered {pong}"));
        }
    }

    output.success("Configuration is valid");
    Ok(())
}
