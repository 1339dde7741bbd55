use std::collections::HashMap;
use std::env;

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;
use url::Url;

/// Provider used when `SSO_PROVIDER_URL` is not set.
pub const DEFAULT_PROVIDER_URL: &str = "https://s3o.ft.com";

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub bind_address: String,
    pub provider_url: Url,
    /// Base64 public-key container, absent until delivered. Deployments
    /// normally leave this unset and feed the key in out-of-band.
    pub public_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid SSO_PROVIDER_URL: {0}")]
    InvalidProviderUrl(#[from] url::ParseError),

    #[error("Base64 decode error in SSO_PUBLIC_KEY: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

impl GateConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let provider_url = Url::parse(
            vars.get("SSO_PROVIDER_URL")
                .map(String::as_str)
                .unwrap_or(DEFAULT_PROVIDER_URL),
        )?;

        let public_key = vars.get("SSO_PUBLIC_KEY").cloned();
        if let Some(key) = &public_key {
            // Reject undecodable material at startup rather than on the
            // first request.
            let compact: String = key.split_ascii_whitespace().collect();
            general_purpose::STANDARD.decode(compact.as_bytes())?;
        }

        Ok(GateConfig {
            bind_address,
            provider_url,
            public_key,
        })
    }
}
