//! MTL User Service
//!
//! gRPC server for accounts and access token issuance.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tonic::transport::Server;
use tracing::info;

use mtl_core::auth::JwtManager;
use mtl_proto::v1::user_service_server::UserServiceServer;
use mtl_user::server::UserServiceImpl;
use mtl_user::storage::UserDatabase;

#[derive(Parser, Debug)]
#[command(name = "mtl-user")]
#[command(version, about = "MTL user service - accounts and access tokens")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "MTL_USER_LISTEN", default_value = "0.0.0.0:50051")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long, env = "MTL_USER_DB")]
    db_path: Option<PathBuf>,

    /// JWT signing secret, shared with the gateway.
    #[arg(long, env = "MTL_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Access token TTL in seconds.
    #[arg(long, env = "MTL_TOKEN_TTL", default_value_t = 86_400)]
    token_ttl: i64,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "MTL_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    mtl_core::tracing_init::init_tracing("mtl_user=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting mtl-user"
    );

    let db_path = match args.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };
    info!(path = %db_path.display(), "Opening user database");
    let db = UserDatabase::open(&db_path).await?;

    let jwt = Arc::new(JwtManager::new(args.jwt_secret.as_bytes(), args.token_ttl));
    let users = UserServiceImpl::new(db, jwt);

    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<UserServiceServer<UserServiceImpl>>()
        .await;

    let router = Server::builder()
        .add_service(health_service)
        .add_service(UserServiceServer::new(users));

    tokio::select! {
        result = router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("User service stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let data = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine data directory"))?;
    Ok(data.join("mtl").join("users.db"))
}
