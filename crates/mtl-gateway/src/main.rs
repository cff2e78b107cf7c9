//! MTL Gateway
//!
//! HTTP/websocket front door for the MTL services.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use mtl_core::auth::JwtManager;
use mtl_core::config::load_config;
use mtl_gateway::clients::BackendClients;
use mtl_gateway::http::{AppState, build_router};
use mtl_gateway::relay::GrpcAgentConnector;

#[derive(Parser, Debug)]
#[command(name = "mtl-gateway")]
#[command(version, about = "MTL gateway - REST routes and agent stream relay")]
struct Args {
    /// Address to listen on (overrides the settings file).
    #[arg(long, env = "MTL_GATEWAY_ADDR")]
    addr: Option<String>,

    /// Path to a JSON settings file.
    #[arg(long, env = "MTL_CONFIG")]
    config: Option<PathBuf>,

    /// User service URL.
    #[arg(long, env = "MTL_USER_ADDR")]
    user_addr: Option<String>,

    /// Configuration service URL.
    #[arg(long, env = "MTL_CONFIGURATION_ADDR")]
    configuration_addr: Option<String>,

    /// Agent service URL.
    #[arg(long, env = "MTL_AGENT_ADDR")]
    agent_addr: Option<String>,

    /// JWT secret shared with the user service.
    #[arg(long, env = "MTL_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Relay session deadline in seconds.
    #[arg(long, env = "MTL_SESSION_TIMEOUT_SECS")]
    session_timeout: Option<u64>,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "MTL_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    mtl_core::tracing_init::init_tracing("mtl_gateway=info,tower_http=info", args.log_json);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(addr) = args.addr {
        config.gateway.addr = addr;
    }
    if let Some(url) = args.user_addr {
        config.services.user = url;
    }
    if let Some(url) = args.configuration_addr {
        config.services.configuration = url;
    }
    if let Some(url) = args.agent_addr {
        config.services.agent = url;
    }
    if let Some(secs) = args.session_timeout {
        config.relay.session_timeout_secs = secs;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.gateway.addr,
        user = %config.services.user,
        configuration = %config.services.configuration,
        agent = %config.services.agent,
        "Starting mtl-gateway"
    );

    let clients = BackendClients::connect_lazy(
        &config.services,
        Duration::from_secs(config.gateway.request_timeout_secs),
    )?;
    let connector = GrpcAgentConnector::new(clients.agents.clone(), config.relay.backend_buffer);

    let state = AppState {
        // Validation only; the user service issues tokens.
        jwt: Arc::new(JwtManager::new(args.jwt_secret.as_bytes(), 0)),
        clients,
        connector: Arc::new(connector),
        session_timeout: Duration::from_secs(config.relay.session_timeout_secs),
        teardown_grace: Duration::from_millis(config.relay.teardown_grace_millis),
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.gateway.addr).await?;
    info!(addr = %listener.local_addr()?, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
            }
        })
        .await?;

    info!("Gateway stopped");
    Ok(())
}
