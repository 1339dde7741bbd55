use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::cookies;

/// Fixed diagnostic body served while key material is still missing.
pub const KEY_UNAVAILABLE_BODY: &str =
    "Has not yet downloaded public key from the single sign-on provider";

/// Fixed error page served when an assertion does not verify.
pub const AUTH_ERROR_BODY: &str =
    "<h1>Authentication error.</h1><p>For access, please login with your account</p>";

#[derive(Debug, Error)]
pub enum GateError {
    /// Key material has not been delivered yet. Fatal for the current
    /// request only; the out-of-band refresher retries, not this layer.
    #[error("public key material has not been delivered yet")]
    KeyUnavailable,

    /// Key bytes failed format conversion. Authentication cannot proceed,
    /// so callers observe the same denial as a bad signature.
    #[error("malformed public key material: {0}")]
    MalformedKey(String),

    /// The assertion did not verify for this username/hostname pair.
    #[error("assertion did not verify")]
    AuthenticationFailed,

    /// The provider callback body could not be read.
    #[error("unreadable callback body: {0}")]
    BadCallbackBody(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::KeyUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, KEY_UNAVAILABLE_BODY).into_response()
            }
            GateError::MalformedKey(_) | GateError::AuthenticationFailed => {
                let mut response = (StatusCode::FORBIDDEN, Html(AUTH_ERROR_BODY)).into_response();
                cookies::append_expired_pair(response.headers_mut());
                response
            }
            GateError::BadCallbackBody(_) => {
                (StatusCode::BAD_REQUEST, "Malformed authentication callback").into_response()
            }
        }
    }
}
