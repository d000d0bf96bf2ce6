//! HTTP plumbing for the registry client.
//!
//! A thin wrapper over `reqwest` handling URL construction, bearer
//! authorization, status-code mapping, and JSON decoding. Every call is a
//! single request/response exchange; timeout handling lives here, retry
//! policy does not exist (the portal core never retries automatically).

use crate::secret::Secret;
use crate::traits::{RegistryError, RegistryResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP client bound to one registry deployment.
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_key: Secret,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, api_key: Secret, timeout_secs: u64) -> RegistryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RegistryError::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Joins the base URL and a path, normalizing slashes.
    pub fn build_url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned + Default>(&self, path: &str) -> RegistryResult<T> {
        let url = self.build_url(path);
        debug!(url = %url, "registry GET");
        let response = self.send(self.client.get(&url)).await?;
        decode_json(response).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> RegistryResult<T> {
        let url = self.build_url(path);
        debug!(url = %url, "registry POST");
        let response = self.send(self.client.post(&url).json(body)).await?;
        decode_json(response).await
    }

    /// PATCH a JSON body and decode the JSON response.
    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: &B,
    ) -> RegistryResult<T> {
        let url = self.build_url(path);
        debug!(url = %url, "registry PATCH");
        let response = self.send(self.client.patch(&url).json(body)).await?;
        decode_json(response).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> RegistryResult<Response> {
        let response = request
            .bearer_auth(self.api_key.expose())
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RegistryError::Timeout(e.to_string())
                } else if e.is_connect() {
                    RegistryError::ConnectionFailed(e.to_string())
                } else {
                    RegistryError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => {
                RegistryError::AuthenticationFailed("Unauthorized".into())
            }
            StatusCode::FORBIDDEN => RegistryError::Forbidden("Forbidden".into()),
            StatusCode::NOT_FOUND => RegistryError::NotFound("Resource not found".into()),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                RegistryError::Unsupported(format!("Registry rejected request: {}", body))
            }
            _ => RegistryError::RequestFailed(format!("Registry error: {}", status)),
        })
    }
}

/// Decodes a successful response body.
///
/// Some registry write endpoints answer a bare `200` with an empty body;
/// that decodes to the type's default rather than an error. A non-empty
/// body that fails to parse is a genuine protocol violation.
async fn decode_json<T: DeserializeOwned + Default>(response: Response) -> RegistryResult<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

    if text.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&text).map_err(|e| {
        RegistryError::InvalidResponse(format!(
            "Failed to parse response (status {}): {} - Body: {}",
            status,
            e,
            text.chars().take(500).collect::<String>()
        ))
    })
}
