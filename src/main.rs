use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use fcm_push_gateway::messaging::FcmClient;
use fcm_push_gateway::{AppConfig, AppState};

#[derive(Parser)]
#[command(name = "fcm-push-gateway")]
#[command(about = "Authenticated HTTP gateway for Firebase Cloud Messaging")]
#[command(version)]
struct Args {
    #[arg(long, help = "Environment file to load instead of ./.env")]
    env_file: Option<PathBuf>,

    #[arg(long, help = "Bind host (overrides PUSH_GATEWAY_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Bind port (overrides PUSH_GATEWAY_PORT)")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // An explicit env file must exist; the default .env is optional
    match &args.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("cannot read env file {}", path.display()))?;
        }
        None => match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e).context("cannot read .env"),
        },
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(args).await {
        tracing::error!("fatal: {:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    tracing::info!("Starting push gateway in {:?} mode", config.environment);

    let client = FcmClient::from_config(&config.provider).context("error getting messaging client")?;
    tracing::info!(
        project = %client.project_id(),
        service_account = %client.client_email(),
        "started app"
    );

    let state = AppState::new(Arc::new(client), config.security.api_key.as_str());
    let app = fcm_push_gateway::app(state, config.server.enable_request_logging);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("push gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
