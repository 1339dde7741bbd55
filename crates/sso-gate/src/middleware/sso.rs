//! The authentication decision engine.
//!
//! Every request entering the gate is evaluated against four states in
//! strict priority order:
//!
//! 1. no public key material yet (500 for everything),
//! 2. provider callback (POST with a `username` query parameter),
//! 3. cookie-carried credential (both session cookies present),
//! 4. no credential (redirect to the provider's authorize endpoint).
//!
//! The shared verification step guards against missing key material a
//! second time, so it can never hand out success cookies keyless.

use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

use crate::cookies::{self, SessionCookies};
use crate::crypto;
use crate::errors::GateError;
use crate::keys::PublicKeyHandle;
use crate::redirect;

/// Query parameter carrying the asserted username on the provider callback.
const USERNAME_PARAM: &str = "username";

/// Body field carrying the signed assertion on the provider callback.
const TOKEN_PARAM: &str = "token";

/// Callback bodies are small urlencoded forms; anything bigger is abuse.
const MAX_CALLBACK_BODY_BYTES: usize = 64 * 1024;

/// Shared state for the gate middleware.
pub struct GateState {
    /// Base URL of the identity provider.
    pub provider_url: Url,
    /// Read-only accessor for the provider's public key material.
    pub key: PublicKeyHandle,
    /// Scheme of the listener itself, used when no `x-forwarded-proto`
    /// header overrides it. Middleware cannot observe TLS state, so
    /// TLS-terminating embedders set this to `https` at construction.
    pub connection_scheme: String,
}

impl GateState {
    pub fn new(provider_url: Url, key: PublicKeyHandle) -> Self {
        Self {
            provider_url,
            key,
            connection_scheme: "http".to_string(),
        }
    }

    pub fn with_connection_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.connection_scheme = scheme.into();
        self
    }
}

/// Username the gate verified for this request, inserted into request
/// extensions on the cookie pass-through path for downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser(pub String);

/// Gate middleware: verify the request's credential or bounce the browser
/// to the provider. Invokes `next` only on a verified cookie credential.
pub async fn require_sso(
    State(state): State<Arc<GateState>>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    // Phase 1: without key material no request can be verified, so none
    // may pass or be bounced to the provider either.
    if state.key.current().await.is_none() {
        warn!(target: "sso", "public key material not yet available");
        return Err(GateError::KeyUnavailable);
    }

    // Normalize cookies into a mapping before any phase looks at them.
    let request_cookies = cookies::parse_cookie_header(req.headers());

    if let Some(username) = callback_username(&req) {
        return provider_callback(&state, req, &username).await;
    }

    if let (Some(username), Some(token)) = (
        request_cookies.get(cookies::USERNAME_COOKIE),
        request_cookies.get(cookies::TOKEN_COOKIE),
    ) {
        let (username, token) = (username.clone(), token.clone());
        return cookie_credential(&state, req, next, username, token).await;
    }

    Ok(redirect_to_provider(&state, req.headers(), req.uri()))
}

/// The asserted username, when this request is a provider callback.
/// An empty `username` value does not count as a callback.
fn callback_username(req: &Request) -> Option<String> {
    if req.method() != Method::POST {
        return None;
    }
    let query = req.uri().query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(name, value)| name == USERNAME_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Phase 2: the provider redirected the browser back with an assertion.
async fn provider_callback(
    state: &GateState,
    req: Request,
    username: &str,
) -> Result<Response, GateError> {
    let hostname = redirect::request_hostname(req.headers());
    let (parts, body) = req.into_parts();

    // The engine's only suspension point: awaiting the urlencoded body.
    let bytes = to_bytes(body, MAX_CALLBACK_BODY_BYTES)
        .await
        .map_err(|e| GateError::BadCallbackBody(e.to_string()))?;
    let token = form_urlencoded::parse(&bytes)
        .find(|(name, _)| name == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();

    debug!(target: "sso", %username, "assertion token found in provider callback");

    let session = authenticate_token(state, username, &hostname, &token).await?;

    // Strip the credential parameters from the URL, keep everything else.
    let location = redirect::clean_redirect_target(&parts.uri, &[USERNAME_PARAM, TOKEN_PARAM]);
    debug!(target: "sso", %location, "callback verified, redirecting to cleaned URL");

    let mut response = cache_busting_redirect(&location);
    session.apply(response.headers_mut());
    Ok(response)
}

/// Phase 3: both session cookies are present; re-verify and pass through.
async fn cookie_credential(
    state: &GateState,
    mut req: Request,
    next: Next,
    username: String,
    token: String,
) -> Result<Response, GateError> {
    debug!(target: "sso", username = %username, "session cookie pair found");

    let hostname = redirect::request_hostname(req.headers());
    let session = authenticate_token(state, &username, &hostname, &token).await?;

    req.extensions_mut().insert(AuthenticatedUser(username));
    let mut response = next.run(req).await;
    session.apply(response.headers_mut());
    Ok(response)
}

/// Phase 4: no credential presented; send the browser to the provider.
fn redirect_to_provider(state: &GateState, headers: &HeaderMap, uri: &Uri) -> Response {
    let scheme = redirect::effective_scheme(headers, &state.connection_scheme);
    let callback = redirect::callback_url(scheme, headers, uri);
    let hostname = redirect::request_hostname(headers);
    let authorize = redirect::authorize_url(&state.provider_url, &hostname, &callback);

    debug!(target: "sso", url = %authorize, "no credential presented, redirecting to provider");

    cache_busting_redirect(&authorize)
}

/// Shared verification step, and the single origin of cookie mutation:
/// success returns the refreshed pair for the caller to attach, failure
/// surfaces errors whose responses clear it.
///
/// Key absence is reported as `KeyUnavailable`, distinguishable from a
/// signature failure, so no caller can issue success cookies without a key.
async fn authenticate_token(
    state: &GateState,
    username: &str,
    hostname: &str,
    token: &str,
) -> Result<SessionCookies, GateError> {
    let Some(material) = state.key.current().await else {
        warn!(target: "sso", "public key material not yet available");
        return Err(GateError::KeyUnavailable);
    };

    let key = crypto::convert_public_key(&material).map_err(|e| {
        warn!(target: "sso", error = %e, "public key material failed conversion");
        e
    })?;

    let message = crypto::signed_message(username, hostname);
    if crypto::verify_signature(&message, token, &key) {
        debug!(target: "sso", %username, "authentication successful");
        Ok(SessionCookies::new(username, token))
    } else {
        debug!(target: "sso", %username, "authentication failed");
        Err(GateError::AuthenticationFailed)
    }
}

/// A redirect that no cache along the way is allowed to remember.
fn cache_busting_redirect(location: &str) -> Response {
    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(header::LOCATION, value);
    }
    response
}
