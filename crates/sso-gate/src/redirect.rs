//! Provider redirect and callback URL construction.

use axum::http::{header, HeaderMap, Uri};
use url::{form_urlencoded, Url};

/// Set by TLS-terminating proxies in front of the gate.
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Path of the provider's authorize endpoint.
const AUTHORIZE_PATH: &str = "/v2/authenticate";

/// The protocol the browser used, as far as the gate can tell.
///
/// `https` exactly when the proxy says so via `x-forwarded-proto`;
/// otherwise the connection-level scheme the gate was constructed with.
pub(crate) fn effective_scheme<'a>(headers: &HeaderMap, connection_scheme: &'a str) -> &'a str {
    let forwarded = headers
        .get(FORWARDED_PROTO_HEADER)
        .and_then(|h| h.to_str().ok());
    if forwarded == Some("https") {
        "https"
    } else {
        connection_scheme
    }
}

/// `Host` header without the port. IPv6 literals keep their brackets.
pub(crate) fn request_hostname(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if let Some(rest) = host.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return format!("[{}]", &rest[..end]);
        }
    }

    host.split(':').next().unwrap_or_default().to_string()
}

/// Absolute URL of the current request, which the provider redirects the
/// browser back to after authenticating.
pub(crate) fn callback_url(scheme: &str, headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let original = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    format!("{}://{}{}", scheme, host, original)
}

/// The provider's authorize URL for this request.
pub(crate) fn authorize_url(provider: &Url, hostname: &str, callback: &str) -> String {
    let mut url = provider.clone();
    url.set_path(AUTHORIZE_PATH);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("post", "true")
        .append_pair("host", hostname)
        .append_pair("redirect", callback);

    url.into()
}

/// The request path with the named query parameters removed and every
/// other parameter preserved.
pub(crate) fn clean_redirect_target(uri: &Uri, strip: &[&str]) -> String {
    let retained: Vec<(String, String)> = uri
        .query()
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .filter(|(name, _)| !strip.contains(&name.as_ref()))
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    if retained.is_empty() {
        uri.path().to_string()
    } else {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(retained)
            .finish();
        format!("{}?{}", uri.path(), query)
    }
}
