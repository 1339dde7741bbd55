//! Session cookie pair management.
//!
//! The two cookies are always set or cleared together; only the shared
//! verification step in `middleware::sso` decides which happens.

use std::collections::HashMap;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use url::form_urlencoded;

/// Cookie carrying the authenticated username.
pub const USERNAME_COOKIE: &str = "s3o_username";

/// Cookie carrying the signed assertion.
pub const TOKEN_COOKIE: &str = "s3o_token";

/// Session window: 900000 ms in the provider's contract. The cookie expiry
/// is the sole time bound on a session; the assertion itself carries none.
pub const COOKIE_MAX_AGE_SECONDS: u64 = 900;

const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// A freshly verified credential pair, ready to be re-issued to the
/// browser with a refreshed expiry.
///
/// Constructed only by the shared verification step on success.
pub(crate) struct SessionCookies {
    username: String,
    token: String,
}

impl SessionCookies {
    pub(crate) fn new(username: &str, token: &str) -> Self {
        Self {
            username: username.to_string(),
            token: token.to_string(),
        }
    }

    /// Append both `Set-Cookie` headers to a response.
    pub(crate) fn apply(&self, headers: &mut HeaderMap) {
        for cookie in [
            session_cookie(USERNAME_COOKIE, &self.username),
            session_cookie(TOKEN_COOKIE, &self.token),
        ] {
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                headers.append(SET_COOKIE, value);
            }
        }
    }
}

/// Expire both cookies immediately.
pub(crate) fn append_expired_pair(headers: &mut HeaderMap) {
    for cookie in [expired_cookie(USERNAME_COOKIE), expired_cookie(TOKEN_COOKIE)] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
}

fn session_cookie(name: &str, value: &str) -> String {
    // Percent-encode so arbitrary usernames and base64 assertions survive
    // the cookie round trip; `parse_cookie_header` reverses this.
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        name, encoded, COOKIE_MAX_AGE_SECONDS
    )
}

fn expired_cookie(name: &str) -> String {
    format!("{}=; Expires={}; Max-Age=0; Path=/; HttpOnly", name, EPOCH_EXPIRES)
}

/// Parse the `Cookie` header into a name/value map.
///
/// Runs at request entry so the decision engine always sees cookies as a
/// mapping, whether or not anything upstream parsed them already.
pub(crate) fn parse_cookie_header(headers: &HeaderMap) -> HashMap<String, String> {
    let Some(raw) = headers.get(COOKIE).and_then(|h| h.to_str().ok()) else {
        return HashMap::new();
    };

    raw.split(';')
        .flat_map(|part| form_urlencoded::parse(part.trim().as_bytes()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}
