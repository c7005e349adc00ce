//! Verification of tokens issued by an external identity provider.
//!
//! The token is sent to the provider's token-info endpoint, which answers with the
//! token's claims when it is valid and with a 4xx status otherwise.

use super::{AuthError, CredentialVerifier, Identity};
use crate::config::RemoteAuthConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Deserialize)]
struct TokenInfo {
    sub: String,
    email: Option<String>,
    aud: Option<String>,
}

pub struct RemoteVerifier {
    client: reqwest::Client,
    token_info_url: Url,
    audience: Option<String>,
}

impl RemoteVerifier {
    pub fn new(config: &RemoteAuthConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(RemoteVerifier {
            client,
            token_info_url: config.token_info_url.clone(),
            audience: config.audience.clone(),
        })
    }
}

#[async_trait]
impl CredentialVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }

        let response = self
            .client
            .get(self.token_info_url.clone())
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AuthError::InvalidToken(
                    "rejected by identity provider".into(),
                ));
            }
            status => {
                return Err(AuthError::ProviderUnavailable(format!(
                    "token info endpoint returned {status}"
                )));
            }
        }

        let info = response
            .json::<TokenInfo>()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        if let Some(expected) = &self.audience
            && info.aud.as_ref() != Some(expected)
        {
            return Err(AuthError::InvalidToken("audience mismatch".into()));
        }

        Ok(Identity {
            subject: info.sub,
            email: info.email,
        })
    }
}
