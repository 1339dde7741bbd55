//! Tests for the no-credential phase: the browser is bounced to the
//! provider's authorize endpoint with the callback URL encoded in.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use anyhow::Result;
use reqwest::header::{CACHE_CONTROL, EXPIRES, LOCATION, PRAGMA};
use reqwest::{Client, StatusCode};
use sso_gate_test_utils::{TestGateServer, TestKeyPair};
use url::Url;

fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

fn location_url(response: &reqwest::Response) -> Url {
    let raw = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    Url::parse(raw).unwrap()
}

#[tokio::test]
async fn test_redirects_to_provider_authorize_endpoint() -> Result<()> {
    // Arrange
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(Some(keys.public_material())).await?;

    // Act
    let response = client()
        .get(format!("{}/some/path?ref=home", server.url()))
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = location_url(&response);
    assert_eq!(location.host_str(), Some("sso.example.com"));
    assert_eq!(location.path(), "/v2/authenticate");

    let pairs: Vec<(String, String)> = location
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("post".to_string(), "true".to_string()),
            ("host".to_string(), server.hostname()),
            (
                "redirect".to_string(),
                format!("{}/some/path?ref=home", server.url()),
            ),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_provider_redirect_is_not_cacheable() -> Result<()> {
    // Arrange
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(Some(keys.public_material())).await?;

    // Act
    let response = client().get(server.url()).send().await?;

    // Assert
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(CACHE_CONTROL).unwrap(),
        "private, no-cache, no-store, must-revalidate"
    );
    assert_eq!(response.headers().get(PRAGMA).unwrap(), "no-cache");
    assert_eq!(response.headers().get(EXPIRES).unwrap(), "0");

    Ok(())
}

#[tokio::test]
async fn test_forwarded_proto_upgrades_callback_scheme() -> Result<()> {
    // Arrange - the gate sits behind a TLS-terminating proxy
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(Some(keys.public_material())).await?;

    // Act
    let response = client()
        .get(format!("{}/some/path", server.url()))
        .header("x-forwarded-proto", "https")
        .send()
        .await?;

    // Assert - the callback the provider redirects back to must be https
    let location = location_url(&response);
    let redirect = location
        .query_pairs()
        .find(|(k, _)| k == "redirect")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert!(redirect.starts_with("https://"));

    Ok(())
}

#[tokio::test]
async fn test_get_with_username_param_is_not_a_callback() -> Result<()> {
    // Arrange - the callback phase requires POST; a GET carrying the same
    // parameters is just an unauthenticated request
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(Some(keys.public_material())).await?;
    let token = keys.sign_assertion("bob", &server.hostname());

    // Act
    let response = client()
        .get(format!("{}/some/path", server.url()))
        .query(&[("username", "bob"), ("token", token.as_str())])
        .send()
        .await?;

    // Assert - bounced to the provider, not verified
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = location_url(&response);
    assert_eq!(location.path(), "/v2/authenticate");

    Ok(())
}
