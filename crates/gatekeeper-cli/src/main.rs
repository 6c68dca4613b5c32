//! CLI binary for running Gatekeeper checks against webhook deliveries.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{Path as RoutePath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use clap::{Parser, Subcommand};

use gatekeeper_checks::{Dispatcher, InboundEvent};
use gatekeeper_github::RestClient;
use gatekeeper_types::{GatekeeperConfig, GatekeeperError};

#[derive(Parser)]
#[command(name = "gatekeeper", version, about = "GitHub pull request checks driven by webhooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one handler against a recorded webhook delivery
    Invoke {
        /// Handler name (artifacts, fixup, label, specification, auto-merge)
        handler: String,

        /// Path to the JSON delivery body
        #[arg(short, long)]
        event: PathBuf,

        /// Content type the delivery was sent with
        #[arg(long, default_value = "application/json")]
        content_type: String,
    },

    /// Serve every handler over HTTP at POST /<handler>
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: String,
    },

    /// List the handlers enabled by the current configuration
    Handlers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = GatekeeperConfig::from_env()?;
    let github = Arc::new(RestClient::from_config(&config));
    let dispatcher = Dispatcher::from_config(&config, github);

    match cli.command {
        Commands::Invoke {
            handler,
            event,
            content_type,
        } => {
            cmd_invoke(&dispatcher, &handler, &event, content_type).await?;
        }
        Commands::Serve { addr } => {
            cmd_serve(dispatcher, &addr).await?;
        }
        Commands::Handlers => {
            for name in dispatcher.handler_names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

async fn cmd_invoke(
    dispatcher: &Dispatcher,
    handler: &str,
    path: &Path,
    content_type: String,
) -> anyhow::Result<()> {
    let event = InboundEvent::from_file(path, Some(content_type))?;
    let response = dispatcher.dispatch(handler, &event).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status_code >= 500 {
        std::process::exit(1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// HTTP server
// ---------------------------------------------------------------------------

async fn cmd_serve(dispatcher: Dispatcher, addr: &str) -> anyhow::Result<()> {
    let names = dispatcher.handler_names();
    let app = Router::new()
        .route("/:handler", post(deliver))
        .with_state(Arc::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr, handlers = ?names, "Listening for webhook deliveries");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn deliver(
    State(dispatcher): State<Arc<Dispatcher>>,
    RoutePath(handler): RoutePath<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    match dispatcher
        .dispatch(&handler, &InboundEvent::new(content_type, body))
        .await
    {
        Ok(response) => (
            StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            response.body,
        ),
        Err(err @ GatekeeperError::UnknownHandler(_)) => (StatusCode::NOT_FOUND, err.to_string()),
        Err(err) => {
            tracing::error!(handler = %handler, error = %err, "Delivery failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error while processing the delivery".to_string(),
            )
        }
    }
}
