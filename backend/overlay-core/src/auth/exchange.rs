use crate::error::auth::AuthError;

use common::{ErrorLocation, RedactedAccessToken};

use std::panic::Location;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    access_token: String,
}

/// Swaps a one-time AUTHORIZE code for an access token over HTTPS.
#[derive(Clone)]
pub struct TokenExchangeClient {
    url: Url,
    client: Client,
}

impl TokenExchangeClient {
    pub fn new(url_str: &str) -> Result<Self, AuthError> {
        let url = Url::parse(url_str)?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT_DURATION)
            .build()?;

        Ok(Self { url, client })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST `{code}` and read `{access_token}` from the response.
    pub async fn exchange(&self, code: &str) -> Result<RedactedAccessToken, AuthError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({ "code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Exchange {
                message: format!(
                    "HTTP {} - {}",
                    response.status().as_u16(),
                    response.text().await.unwrap_or_default()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let body: ExchangeResponse = response.json().await?;
        Ok(RedactedAccessToken::try_new(body.access_token)?)
    }
}
