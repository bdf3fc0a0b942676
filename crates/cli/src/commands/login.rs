//! Login flow commands.
//!
//! `url` prints a provider login URL together with the state and nonce that
//! must be passed back to `callback`.

use serde::Serialize;

use orderdesk_service::services::identity::LoginRedirect;

use super::{CommandError, connect_state, print_json};

#[derive(Serialize)]
struct LoginStart<'a> {
    url: &'a str,
    state: &'a str,
    nonce: &'a str,
}

#[derive(Serialize)]
struct LoginDone<'a, T: Serialize> {
    customer: &'a T,
    provider_access_token: &'a str,
}

/// Print a fresh login redirect.
pub async fn url() -> Result<(), CommandError> {
    let state = connect_state().await?;
    let redirect = state.login_url();
    print_json(&LoginStart {
        url: &redirect.url,
        state: &redirect.state,
        nonce: &redirect.nonce,
    })
}

/// Complete a login and print the registered customer.
pub async fn callback(
    code: &str,
    issued_state: String,
    nonce: String,
    returned_state: &str,
) -> Result<(), CommandError> {
    let state = connect_state().await?;
    let issued = LoginRedirect {
        url: String::new(),
        state: issued_state,
        nonce,
    };
    let (customer, access_token) = state.complete_login(code, &issued, returned_state).await?;
    print_json(&LoginDone {
        customer: &customer,
        provider_access_token: &access_token,
    })
}
