use std::sync::Arc;

use tokio::sync::RwLock;

/// Read-only accessor for the provider's current public key material.
///
/// The material arrives as an opaque base64 blob and is replaced
/// out-of-band by whatever refresh process the embedding application runs;
/// the gate itself never fetches or mutates it. Every request observes an
/// immutable snapshot, and `None` (not yet delivered) is a first-class
/// state that each request must tolerate.
#[derive(Clone, Default)]
pub struct PublicKeyHandle {
    inner: Arc<RwLock<Option<String>>>,
}

impl PublicKeyHandle {
    /// Handle with no material yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle pre-loaded with key material.
    pub fn with_key(material: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(material.into()))),
        }
    }

    /// Replace the key material. Called by the out-of-band refresher, never
    /// by the gate.
    pub async fn set(&self, material: impl Into<String>) {
        *self.inner.write().await = Some(material.into());
    }

    /// Current snapshot of the material, `None` until the first delivery.
    pub async fn current(&self) -> Option<String> {
        self.inner.read().await.clone()
    }
}
