//! sqlgated - the sqlgate server binary.

use anyhow::Context;
use clap::Parser;
use sqlgate_server::{DriverRegistry, Gateway, Server, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sqlgated",
    version,
    about = "Remote SQL query gateway speaking line-delimited JSON-RPC"
)]
struct Args {
    /// Interface to bind.
    #[arg(long, default_value = "127.0.0.1", env = "SQLGATE_HOST")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 5123, env = "SQLGATE_PORT")]
    port: u16,

    /// Password to require from clients (optional; empty disables auth).
    #[arg(long, default_value = "", env = "SQLGATE_PASSWORD")]
    password: String,

    /// Server certificate for TLS (optional).
    #[arg(long, requires = "key")]
    cert: Option<PathBuf>,

    /// Server private key for TLS (optional).
    #[arg(long, requires = "cert")]
    key: Option<PathBuf>,

    /// Skip certificate verification. Only meaningful for the client
    /// role; accepted here for a symmetric flag surface.
    #[arg(long)]
    skip_verify: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        secret: args.password,
        cert: args.cert,
        key: args.key,
        skip_verify: args.skip_verify,
    };

    let registry = Arc::new(DriverRegistry::with_defaults());
    info!(drivers = ?registry.drivers(), auth = !config.secret.is_empty(), "starting");

    let gateway = Gateway::new(config.secret.clone(), registry);
    let server = Server::bind(&config, gateway)
        .await
        .context("failed to start listener")?;

    server.serve().await.context("listener failed")
}
