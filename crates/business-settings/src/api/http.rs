//! HTTP implementation of the settings backend.
//!
//! # API Endpoints
//!
//! - All tenants: `GET {base_url}/business-settings`
//! - Own company: `GET {base_url}/business-settings/me`
//! - Update own company: `PUT {base_url}/business-settings/me`
//!
//! Requests carry Bearer token authentication; the base URL is
//! environment-configured by the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};

use crate::errors::{Result, SettingsError};
use crate::models::{BusinessSettings, SettingsUpdate};

use super::SettingsApi;

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reqwest-backed settings backend client.
pub struct HttpSettingsApi {
    client: Client,
    base_url: String,
    auth_token: String,
}

impl HttpSettingsApi {
    /// Create a new client for the given base URL and bearer token.
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .bearer_auth(&self.auth_token)
    }

    /// Send a request and decode the JSON body, mapping HTTP statuses onto
    /// the error taxonomy (404 becomes `NotFound`, the rest `Backend`).
    async fn execute<T>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(SettingsError::NotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(SettingsError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SettingsApi for HttpSettingsApi {
    async fn list_settings(&self) -> Result<Vec<BusinessSettings>> {
        let endpoint = "GET /business-settings";
        let builder = self.request(Method::GET, "/business-settings");
        self.execute(builder, endpoint).await
    }

    async fn my_settings(&self) -> Result<BusinessSettings> {
        let endpoint = "GET /business-settings/me";
        let builder = self.request(Method::GET, "/business-settings/me");
        self.execute(builder, endpoint).await
    }

    async fn update_my_settings(&self, update: &SettingsUpdate) -> Result<BusinessSettings> {
        let endpoint = "PUT /business-settings/me";
        let builder = self
            .request(Method::PUT, "/business-settings/me")
            .json(update);
        self.execute(builder, endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped_from_base_url() {
        let api = HttpSettingsApi::new("https://api.example.com/v1/", "token");
        assert_eq!(api.base_url, "https://api.example.com/v1");
    }
}
