//! Test server harness for end-to-end testing.
//!
//! Provides `TestGateServer` for spawning a real gate-fronted application
//! in tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use sso_gate::keys::PublicKeyHandle;
use sso_gate::middleware::sso::{self, AuthenticatedUser, GateState};
use tokio::task::JoinHandle;
use url::Url;

/// Provider base used by every spawned test gate.
pub const TEST_PROVIDER_URL: &str = "https://sso.example.com";

/// Test harness for spawning a gate-fronted demo application.
///
/// # Example
/// ```rust,ignore
/// let server = TestGateServer::spawn(Some(keys.public_material())).await?;
/// let client = reqwest::Client::builder()
///     .redirect(reqwest::redirect::Policy::none())
///     .build()?;
///
/// let response = client.get(server.url()).send().await?;
/// assert_eq!(response.status(), 302);
/// ```
pub struct TestGateServer {
    addr: SocketAddr,
    key: PublicKeyHandle,
    _handle: JoinHandle<()>,
}

impl TestGateServer {
    /// Spawn a gate-fronted demo app on a random local port.
    ///
    /// `key_material` of `None` simulates the not-yet-delivered key state.
    pub async fn spawn(key_material: Option<String>) -> Result<Self, anyhow::Error> {
        let key = match key_material {
            Some(material) => PublicKeyHandle::with_key(material),
            None => PublicKeyHandle::new(),
        };

        let provider_url = Url::parse(TEST_PROVIDER_URL)?;
        let state = Arc::new(GateState::new(provider_url, key.clone()));

        // Two protected routes so tests can exercise non-root paths
        let app = Router::new()
            .route("/", get(whoami))
            .route("/some/path", get(whoami))
            .route_layer(axum::middleware::from_fn_with_state(state, sso::require_sso));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test gate server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            key,
            _handle: handle,
        })
    }

    /// Base URL of the spawned server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// The hostname the gate sees in the `Host` header, i.e. what
    /// assertions must be signed against.
    pub fn hostname(&self) -> String {
        self.addr.ip().to_string()
    }

    /// Handle to the key material, for delivering or rotating it mid-test.
    pub fn key(&self) -> &PublicKeyHandle {
        &self.key
    }
}

async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
    format!("Hello, {}", user.0)
}
