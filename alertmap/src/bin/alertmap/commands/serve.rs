use anyhow::{Context, Result};
use clap::Args;
use log::info;
use tokio::net::TcpListener;

use alertmap::{AlertService, Store, http};

use crate::context::{Backend, RuntimeContext};
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Local development",
        commands: &[
            "alertmap serve                          # In-memory store on 127.0.0.1:8080",
            "alertmap serve --bind 0.0.0.0:3000      # Listen on every interface",
        ],
    },
    ExampleGroup {
        title: "Redis-backed",
        commands: &[
            "REDIS_URL=redis://127.0.0.1/ alertmap --backend redis serve",
            "alertmap --config alertmap.toml serve",
        ],
    },
];

#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(long, env = "ALERTMAP_BIND")]
    pub bind: Option<String>,
}

pub async fn handle_serve(args: ServeArgs, ctx: &RuntimeContext, output: &OutputManager) -> Result<()> {
    let bind = match args.bind {
        Some(bind) => bind,
        None => ctx.config.bind_address()?,
    };
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    output.success(&format!(
        "Serving alerts on http://{bind} ({} backend)",
        ctx.backend()
    ));

    match ctx.open().await? {
        Backend::Memory(service) => {
            output.warning("In-memory store: data is lost when the server stops.");
            run(listener, service, "memory").await
        }
        Backend::Redis(service) => run(listener, service, "redis").await,
    }
}

async fn run<S: Store>(listener: TcpListener, service: AlertService<S>, backend: &'static str) -> Result<()> {
    let app = http::router(http::AppState::new(service, backend));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
