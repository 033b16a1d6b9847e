// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use strava_mcp::config::{ServerConfig, Transport};
use strava_mcp::server::McpServer;
use strava_mcp::tools::strava_tools;

#[derive(Parser, Debug)]
#[command(name = "strava-mcp")]
#[command(version, about = "MCP server exposing the Strava API as tools for AI agents", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "STRAVA_MCP_CONFIG", default_value = "strava-mcp.toml")]
    config: PathBuf,

    /// Environment file with Strava credentials (defaults to ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Transport to serve on: stdio or http
    #[arg(short, long)]
    transport: Option<Transport>,

    /// Host to bind the HTTP transport to
    #[arg(long)]
    host: Option<String>,

    /// Port for the HTTP transport
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Before tracing so RUST_LOG may come from the file
    let env_file = match &args.env_file {
        Some(path) => Some(
            dotenvy::from_path(path)
                .map(|_| path.clone())
                .with_context(|| format!("Failed to load environment file {}", path.display()))?,
        ),
        None => dotenvy::dotenv().ok(),
    };

    init_tracing(args.log_json);

    tracing::info!("Strava MCP server starting...");
    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let missing = config.strava.missing_credentials();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "Strava credentials not set; every tool call will fail to authenticate"
        );
    }

    let client = config.strava.build_client()?;
    let registry = strava_tools(Arc::new(client), config.analysis.limits());
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    match config.server.transport {
        Transport::Stdio => server.serve_stdio().await?,
        Transport::Http => server.serve_http(config.server.socket_addr()?).await?,
    }

    Ok(())
}

// stdout carries the protocol, so logs always go to stderr
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "strava_mcp=info,strava_sdk=info,tower_http=info".into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
