//! MTL Configuration Service
//!
//! gRPC server for per-user agent configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;

use mtl_configuration::cipher::FieldCipher;
use mtl_configuration::server::ConfigurationServiceImpl;
use mtl_configuration::storage::ConfigurationDatabase;
use mtl_proto::v1::configuration_service_server::ConfigurationServiceServer;

#[derive(Parser, Debug)]
#[command(name = "mtl-configuration")]
#[command(version, about = "MTL configuration service - agent settings with encrypted secrets")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "MTL_CONFIGURATION_LISTEN", default_value = "0.0.0.0:50052")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long, env = "MTL_CONFIGURATION_DB")]
    db_path: Option<PathBuf>,

    /// Base64-encoded 32-byte AES-256-GCM key for secret fields.
    #[arg(long, env = "MTL_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "MTL_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    mtl_core::tracing_init::init_tracing("mtl_configuration=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting mtl-configuration"
    );

    let cipher = Arc::new(FieldCipher::from_base64_key(&args.encryption_key)?);

    let db_path = match args.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening configuration database");
    let db = ConfigurationDatabase::open(&db_path).await?;

    let configurations = ConfigurationServiceImpl::new(db, cipher);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<ConfigurationServiceServer<ConfigurationServiceImpl>>()
        .await;

    let router = Server::builder()
        .add_service(health_service)
        .add_service(ConfigurationServiceServer::new(configurations));

    tokio::select! {
        result = router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Configuration service stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let data = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine data directory"))?;
    Ok(data.join("mtl").join("configurations.db"))
}
