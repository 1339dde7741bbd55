//! Tests for the key-unavailable state.
//!
//! Until the out-of-band refresher delivers the provider's public key,
//! every request must observe a 500 with the fixed diagnostic body and no
//! cookie changes, whatever credential it carries.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use anyhow::Result;
use reqwest::header::SET_COOKIE;
use reqwest::{Client, StatusCode};
use sso_gate::errors::KEY_UNAVAILABLE_BODY;
use sso_gate_test_utils::{TestGateServer, TestKeyPair};

fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

#[tokio::test]
async fn test_credentialless_request_gets_500_while_key_missing() -> Result<()> {
    // Arrange
    let server = TestGateServer::spawn(None).await?;

    // Act
    let response = client().get(server.url()).send().await?;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get_all(SET_COOKIE).iter().count(),
        0,
        "Key-unavailable responses must not touch cookies"
    );
    assert_eq!(response.text().await?, KEY_UNAVAILABLE_BODY);

    Ok(())
}

#[tokio::test]
async fn test_cookie_request_gets_500_while_key_missing() -> Result<()> {
    // Arrange
    let server = TestGateServer::spawn(None).await?;

    // Act
    let response = client()
        .get(server.url())
        .header("Cookie", "s3o_username=bob; s3o_token=abc")
        .send()
        .await?;

    // Assert - 500, and the cookies are neither refreshed nor cleared
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers().get_all(SET_COOKIE).iter().count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_callback_gets_500_while_key_missing() -> Result<()> {
    // Arrange - a callback that would verify if the key were present
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(None).await?;
    let token = keys.sign_assertion("bob", &server.hostname());

    // Act
    let response = client()
        .post(format!("{}/some/path", server.url()))
        .query(&[("username", "bob")])
        .form(&[("token", token.as_str())])
        .send()
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get_all(SET_COOKIE).iter().count(),
        0,
        "No success cookies may be issued without key material"
    );

    Ok(())
}

#[tokio::test]
async fn test_key_delivery_unblocks_requests() -> Result<()> {
    // Arrange - server starts keyless
    let keys = TestKeyPair::generate();
    let server = TestGateServer::spawn(None).await?;

    let before = client().get(server.url()).send().await?;
    assert_eq!(before.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Act - the out-of-band refresher delivers the key
    server.key().set(keys.public_material()).await;

    let token = keys.sign_assertion("bob", &server.hostname());
    let after = client()
        .post(format!("{}/some/path", server.url()))
        .query(&[("username", "bob")])
        .form(&[("token", token.as_str())])
        .send()
        .await?;

    // Assert - the same request shape now verifies
    assert_eq!(after.status(), StatusCode::FOUND);

    Ok(())
}
