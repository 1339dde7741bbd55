use std::net::SocketAddr;
use std::sync::Arc;

use sso_gate::config::GateConfig;
use sso_gate::keys::PublicKeyHandle;
use sso_gate::middleware::sso::GateState;
use sso_gate::routes;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sso_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SSO gateway");

    // Load configuration
    let config = GateConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Key material is normally delivered out-of-band; the environment
    // variable covers static deployments and local runs.
    let key = match &config.public_key {
        Some(material) => {
            info!("Public key material loaded from environment");
            PublicKeyHandle::with_key(material.clone())
        }
        None => {
            info!("No public key material yet; requests fail with 500 until it is delivered");
            PublicKeyHandle::new()
        }
    };

    let state = Arc::new(GateState::new(config.provider_url.clone(), key));

    // Build application routes
    let app = routes::build_routes(state);

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("SSO gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
