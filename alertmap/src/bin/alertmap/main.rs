mod commands;
mod context;
mod examples;
mod output;

use anyhow::Result;
use clap::{
    CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use std::path::PathBuf;

use alertmap::StorageBackend;
use commands::{
    categories::{CategoriesArgs, handle_categories},
    check_config::{CheckConfigArgs, handle_check_config},
    profile::{ProfileArgs, handle_profile},
    recompute::{RecomputeArgs, handle_recompute},
    serve::{ServeArgs, handle_serve},
};
use context::RuntimeContext;
use output::{GlobalOptions, OutputFormat, OutputManager};

const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Cyan.on_default().bold())
    .usage(AnsiColor::BrightBlue.on_default().bold())
    .literal(AnsiColor::Magenta.on_default())
    .placeholder(AnsiColor::BrightBlack.on_default())
    .valid(AnsiColor::Green.on_default())
    .invalid(AnsiColor::Yellow.on_default())
    .error(AnsiColor::Red.on_default().bold());

#[derive(Parser)]
#[command(name = "alertmap")]
#[command(version)]
#[command(
    about = "Community incident reporting service",
    long_about = r#"Community incident reporting service that provides:

• Alert reports with categories, comments, and an owner-driven lifecycle
• A per-user reaction ledger (like / dislike) with cached counters
• Reputation statistics recomputed on every change

Commands:
  serve         Run the HTTP API
  categories    Show the category catalog
  profile       Show a user's statistics
  recompute     Rebuild every counter and statistic
  check-config  Validate the effective configuration
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true, styles = HELP_STYLES)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file
    #[arg(long, env = "ALERTMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Storage backend (overrides `storage.backend`)
    #[arg(long, env = "ALERTMAP_BACKEND", global = true)]
    backend: Option<StorageBackend>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_with_examples() -> Self {
        let matches = examples::attach(Cli::command()).get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Show the category catalog
    Categories(CategoriesArgs),

    /// Show a user's profile statistics
    Profile(ProfileArgs),

    /// Recount every alert's reactions, then rebuild every user's statistics
    Recompute(RecomputeArgs),

    /// Validate the effective configuration
    CheckConfig(CheckConfigArgs),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_examples();

    match execute(cli).await {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let global_options = GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };
    if global_options.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(global_options);
    let ctx = RuntimeContext::load(cli.config, cli.backend)?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, &ctx, &output).await?,
        Commands::Categories(args) => handle_categories(args, &ctx, &output)?,
        Commands::Profile(args) => handle_profile(args, &ctx, &output).await?,
        Commands::Recompute(args) => handle_recompute(args, &ctx, &output).await?,
        Commands::CheckConfig(args) => handle_check_config(args, &ctx, &output).await?,
    }

    Ok(())
}
