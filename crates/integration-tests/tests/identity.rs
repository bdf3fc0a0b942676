//! Credential verification and login through the application state.

#![allow(clippy::unwrap_used)]

use http::{HeaderMap, HeaderValue};

use orderdesk_integration_tests::{FakeProvider, TestApp};
use orderdesk_service::ErrorKind;
use orderdesk_service::services::identity::{TOKEN_HEADER, credential_from_headers};

fn provider() -> FakeProvider {
    FakeProvider::new()
        .with_account("good-code", "Ivy@Example.com")
        .with_account("no-email", "")
}

#[tokio::test]
async fn test_authenticate_then_place_order() {
    let app = TestApp::new(provider());

    let ctx = app.state.authenticate("good-code").await.unwrap();
    assert_eq!(ctx.principal().unwrap().as_str(), "ivy@example.com");

    let order = app.state.create_order(&ctx, "widget", "1.00").await.unwrap();
    let customer = app.state.customer_by_name("ivy@example.com").await.unwrap();
    assert_eq!(order.customer_id(), customer.id());
}

#[tokio::test]
async fn test_rejected_credential_is_exchange_failure() {
    let app = TestApp::new(provider());
    let err = app.state.authenticate("stolen").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExchangeFailed);
    // Single round trip, no retry.
    assert_eq!(app.provider.calls(), 1);
}

#[tokio::test]
async fn test_empty_credential_is_missing() {
    let app = TestApp::new(provider());
    let err = app.state.authenticate("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialMissing);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn test_unusable_profile_email_is_profile_failure() {
    let app = TestApp::new(provider());
    let err = app.state.authenticate("no-email").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProfileFetchFailed);
}

#[tokio::test]
async fn test_login_registers_customer_once() {
    let app = TestApp::new(provider());

    let redirect = app.state.login_url();
    assert!(redirect.url.starts_with("https://idp.test/authorize"));

    let (customer, token) = app
        .state
        .complete_login("good-code", &redirect, &redirect.state)
        .await
        .unwrap();
    assert_eq!(customer.name().as_str(), "ivy@example.com");
    assert_eq!(token, "at-good-code");

    // Repeat login for the same identity hits the strict create path.
    let again = app.state.login_url();
    let err = app
        .state
        .complete_login("good-code", &again, &again.state)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(app.store.customer_count(), 1);
}

#[tokio::test]
async fn test_login_access_token_cannot_authenticate() {
    let app = TestApp::new(provider());
    let redirect = app.state.login_url();
    let (_, access_token) = app
        .state
        .complete_login("good-code", &redirect, &redirect.state)
        .await
        .unwrap();

    let err = app.state.authenticate(&access_token).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExchangeFailed);

    let ctx = app.state.authenticate("good-code").await.unwrap();
    assert_eq!(ctx.principal().unwrap().as_str(), "ivy@example.com");
}

#[tokio::test]
async fn test_login_with_forged_state_is_rejected() {
    let app = TestApp::new(provider());
    let redirect = app.state.login_url();

    let err = app
        .state
        .complete_login("good-code", &redirect, "forged")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VerificationFailed);
    assert_eq!(app.store.customer_count(), 0);
}

#[tokio::test]
async fn test_header_credential_feeds_authenticate() {
    let app = TestApp::new(provider());
    let mut headers = HeaderMap::new();
    headers.insert(TOKEN_HEADER, HeaderValue::from_static("good-code"));

    let credential = credential_from_headers(&headers).unwrap();
    let ctx = app.state.authenticate(credential).await.unwrap();
    assert!(ctx.principal().is_ok());
}
