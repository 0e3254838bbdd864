use anyhow::Result;
use axum::{Router, routing::get};
use clap::Parser;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle_core::{IceServerConfig, default_ice_servers};
use huddle_server::{RelayService, ws_handler};

#[derive(Parser)]
#[command(name = "huddle-server", about = "Room-scoped signaling relay")]
struct Args {
    /// Address to bind the relay on. Falls back to HUDDLE_BIND, then to
    /// 0.0.0.0:3000.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// STUN server URL handed to clients; repeatable. Falls back to
    /// HUDDLE_STUN (comma separated), then to public address discovery
    /// servers.
    #[arg(long = "stun")]
    stun: Vec<String>,
}

fn bind_addr(args: &Args) -> Result<SocketAddr> {
    if let Some(bind) = args.bind {
        return Ok(bind);
    }
    match env::var("HUDDLE_BIND") {
        Ok(raw) => Ok(raw.parse()?),
        Err(_) => Ok(SocketAddr::from(([0, 0, 0, 0], 3000))),
    }
}

fn ice_servers(args: &Args) -> Vec<IceServerConfig> {
    if !args.stun.is_empty() {
        return args.stun.iter().map(IceServerConfig::stun).collect();
    }
    if let Ok(raw) = env::var("HUDDLE_STUN") {
        let servers: Vec<IceServerConfig> = raw
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(IceServerConfig::stun)
            .collect();
        if !servers.is_empty() {
            return servers;
        }
    }
    default_ice_servers()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let bind = bind_addr(&args)?;
    let service = RelayService::new(ice_servers(&args));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service);

    info!("signaling relay listening on http://{}", bind);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
