//! SMS gateway client.
//!
//! Posts a form-encoded message to the gateway's messaging endpoint,
//! authenticated with the account API key in an `apikey` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use super::{NotificationGateway, NotificationRequest, NotifyError};
use crate::config::SmsConfig;

const API_KEY_HEADER: &str = "apikey";

/// SMS gateway client.
#[derive(Clone)]
pub struct SmsGateway {
    client: reqwest::Client,
    endpoint: Url,
    username: String,
    sender: Option<String>,
}

impl SmsGateway {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(config: &SmsConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| NotifyError::Invalid(format!("Invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.base_url.clone(),
            username: config.username.clone(),
            sender: config.sender.clone(),
        })
    }

    fn form<'a>(&'a self, request: &'a NotificationRequest) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("username", self.username.as_str()),
            ("to", request.destination.as_str()),
            ("message", request.message.as_str()),
            ("enqueue", "1"),
        ];
        if let Some(sender) = &self.sender {
            form.push(("from", sender.as_str()));
        }
        form
    }
}

#[async_trait]
impl NotificationGateway for SmsGateway {
    #[instrument(skip_all)]
    async fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&self.form(request))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "SMS accepted by gateway");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config(sender: Option<&str>) -> SmsConfig {
        SmsConfig {
            base_url: Url::parse("https://sms.test/version1/messaging").unwrap(),
            username: "orderdesk".to_owned(),
            api_key: SecretString::from("k3y-Qw8rT5zLm2Np"),
            sender: sender.map(str::to_owned),
            destination: "+254700000000".to_owned(),
        }
    }

    fn request() -> NotificationRequest {
        NotificationRequest {
            destination: "+254711111111".to_owned(),
            message: "hello".to_owned(),
        }
    }

    #[test]
    fn test_form_fields() {
        let gateway = SmsGateway::new(&config(None), Duration::from_secs(5)).unwrap();
        let request = request();
        let form = gateway.form(&request);
        assert_eq!(
            form,
            vec![
                ("username", "orderdesk"),
                ("to", "+254711111111"),
                ("message", "hello"),
                ("enqueue", "1"),
            ]
        );
    }

    #[test]
    fn test_form_includes_sender_when_configured() {
        let gateway = SmsGateway::new(&config(Some("ORDERDESK")), Duration::from_secs(5)).unwrap();
        let request = request();
        assert!(gateway.form(&request).contains(&("from", "ORDERDESK")));
    }

    #[test]
    fn test_api_key_header_name() {
        let name = reqwest::header::HeaderName::from_static(API_KEY_HEADER);
        assert_eq!(name.as_str(), "apikey");
    }

    #[test]
    fn test_rejects_api_key_with_newline() {
        let mut config = config(None);
        config.api_key = SecretString::from("bad\nkey");
        assert!(matches!(
            SmsGateway::new(&config, Duration::from_secs(5)),
            Err(NotifyError::Invalid(_))
        ));
    }
}
