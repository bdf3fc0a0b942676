//! `OpenID` Connect provider client.
//!
//! Endpoints are taken from the issuer's discovery document. ID tokens are
//! checked against the provider's JWKS: signature, `aud` equal to the client
//! ID, `iss` equal to the issuer, and `exp`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};
use url::Url;

use super::{IdentityProvider, Profile, ProviderError, TokenSet, VerifiedClaims};
use crate::config::OidcConfig;

const DISCOVERY_PATH: &str = ".well-known/openid-configuration";
const SCOPES: &str = "openid email profile";

/// Subset of the discovery document used by the client.
#[derive(Debug, Clone, Deserialize)]
struct Discovery {
    issuer: String,
    authorization_endpoint: Url,
    token_endpoint: Url,
    userinfo_endpoint: Url,
    jwks_uri: Url,
}

/// Client for a single `OpenID` Connect provider.
#[derive(Clone)]
pub struct OidcClient {
    inner: Arc<OidcClientInner>,
}

struct OidcClientInner {
    client: reqwest::Client,
    discovery: Discovery,
    client_id: String,
    client_secret: SecretString,
    redirect_url: Url,
    jwks: RwLock<JwkSet>,
}

impl OidcClient {
    /// Fetch the issuer's discovery document and signing keys.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be fetched or parsed.
    #[instrument(skip_all, fields(issuer = %config.issuer_url))]
    pub async fn discover(config: &OidcConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let discovery_url = discovery_url(&config.issuer_url)?;
        let response = client.get(discovery_url).send().await?;
        let discovery: Discovery = read_json(response).await?;

        let jwks = fetch_jwks(&client, &discovery.jwks_uri).await?;
        info!(
            issuer = %discovery.issuer,
            keys = jwks.keys.len(),
            "OIDC provider discovered"
        );

        Ok(Self {
            inner: Arc::new(OidcClientInner {
                client,
                discovery,
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                redirect_url: config.redirect_url.clone(),
                jwks: RwLock::new(jwks),
            }),
        })
    }

    /// Issuer identifier reported by the provider.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.inner.discovery.issuer
    }

    /// Find the decoding key for `kid`, refetching the JWKS once if the
    /// provider has rotated keys.
    async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, ProviderError> {
        {
            let jwks = self.inner.jwks.read().await;
            if let Some(key) = select_key(&jwks, kid)? {
                return Ok(key);
            }
        }

        debug!(?kid, "Signing key not cached, refreshing JWKS");
        let fresh = fetch_jwks(&self.inner.client, &self.inner.discovery.jwks_uri).await?;
        let key = select_key(&fresh, kid)?;
        *self.inner.jwks.write().await = fresh;

        key.ok_or_else(|| ProviderError::Invalid(format!("no signing key for kid {kid:?}")))
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorization_url(&self, state: &str, nonce: &str) -> String {
        let mut url = self.inner.discovery.authorization_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", self.inner.redirect_url.as_str())
            .append_pair("scope", SCOPES)
            .append_pair("state", state)
            .append_pair("nonce", nonce);
        url.into()
    }

    #[instrument(skip_all)]
    async fn exchange(&self, credential: &str) -> Result<TokenSet, ProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", credential),
            ("redirect_uri", self.inner.redirect_url.as_str()),
        ];

        let response = self
            .inner
            .client
            .post(self.inner.discovery.token_endpoint.clone())
            .form(&params)
            .send()
            .await?;

        read_json(response).await
    }

    #[instrument(skip_all)]
    async fn verify(
        &self,
        tokens: &TokenSet,
        nonce: Option<&str>,
    ) -> Result<VerifiedClaims, ProviderError> {
        let id_token = tokens
            .id_token
            .as_deref()
            .ok_or_else(|| ProviderError::Invalid("token response has no id_token".to_owned()))?;

        let header = decode_header(id_token)?;
        let key = self.decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.inner.client_id]);
        validation.set_issuer(&[&self.inner.discovery.issuer]);

        let claims = decode::<VerifiedClaims>(id_token, &key, &validation)?.claims;

        if let Some(expected) = nonce
            && claims.nonce.as_deref() != Some(expected)
        {
            return Err(ProviderError::Invalid("nonce mismatch".to_owned()));
        }

        Ok(claims)
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, tokens: &TokenSet) -> Result<Profile, ProviderError> {
        let response = self
            .inner
            .client
            .get(self.inner.discovery.userinfo_endpoint.clone())
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;

        read_json(response).await
    }
}

fn discovery_url(issuer: &Url) -> Result<Url, ProviderError> {
    // Keep any issuer path segment: https://host/realm -> https://host/realm/.well-known/...
    let mut base = issuer.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    base.join(DISCOVERY_PATH)
        .map_err(|e| ProviderError::Invalid(format!("bad issuer URL: {e}")))
}

async fn fetch_jwks(client: &reqwest::Client, uri: &Url) -> Result<JwkSet, ProviderError> {
    let response = client.get(uri.clone()).send().await?;
    read_json(response).await
}

fn select_key(jwks: &JwkSet, kid: Option<&str>) -> Result<Option<DecodingKey>, ProviderError> {
    let jwk = match kid {
        Some(kid) => jwks.find(kid),
        None if jwks.keys.len() == 1 => jwks.keys.first(),
        None => None,
    };
    jwk.map(DecodingKey::from_jwk)
        .transpose()
        .map_err(ProviderError::from)
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::Invalid(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_url_for_bare_host() {
        let issuer = Url::parse("https://accounts.google.com").unwrap();
        assert_eq!(
            discovery_url(&issuer).unwrap().as_str(),
            "https://accounts.google.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_keeps_issuer_path() {
        let issuer = Url::parse("https://idp.test/realms/shop").unwrap();
        assert_eq!(
            discovery_url(&issuer).unwrap().as_str(),
            "https://idp.test/realms/shop/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_document_parses_endpoints() {
        let discovery: Discovery = serde_json::from_str(
            r#"{
                "issuer": "https://idp.test",
                "authorization_endpoint": "https://idp.test/authorize",
                "token_endpoint": "https://idp.test/token",
                "userinfo_endpoint": "https://idp.test/userinfo",
                "jwks_uri": "https://idp.test/jwks",
                "response_types_supported": ["code"]
            }"#,
        )
        .unwrap();
        assert_eq!(discovery.token_endpoint.path(), "/token");
        assert_eq!(discovery.jwks_uri.as_str(), "https://idp.test/jwks");

        let bad = r#"{"issuer": "x", "authorization_endpoint": "not a url",
            "token_endpoint": "https://idp.test/token",
            "userinfo_endpoint": "https://idp.test/userinfo",
            "jwks_uri": "https://idp.test/jwks"}"#;
        assert!(serde_json::from_str::<Discovery>(bad).is_err());
    }

    #[test]
    fn test_select_key_without_kid_needs_single_key() {
        let empty = JwkSet { keys: Vec::new() };
        assert!(select_key(&empty, None).unwrap().is_none());
        assert!(select_key(&empty, Some("abc")).unwrap().is_none());
    }
}
