//! services/client/src/adapters/http.rs
//!
//! The shared HTTP plumbing used by every backend adapter: one pooled
//! `reqwest` client, the backend base URL, and the mapping from HTTP
//! responses onto `PortError`.

use hermes_core::domain::Credential;
use hermes_core::ports::{PortError, PortResult};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A cheaply clonable handle on the backend, shared by all adapters.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

impl BackendClient {
    /// Creates a client for the backend rooted at `base`.
    pub fn new(mut base: Url, timeout: Duration) -> PortResult<Self> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PortError::Unexpected(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves a backend path (or a server-relative reference such as
    /// `/pdf-image?...`) against the base URL.
    pub fn endpoint(&self, path: &str) -> PortResult<Url> {
        self.base
            .join(path)
            .map_err(|e| PortError::Unexpected(format!("invalid backend path '{}': {}", path, e)))
    }

    pub fn get(&self, path: &str) -> PortResult<RequestBuilder> {
        Ok(self.http.get(self.endpoint(path)?))
    }

    pub fn post(&self, path: &str) -> PortResult<RequestBuilder> {
        Ok(self.http.post(self.endpoint(path)?))
    }

    pub fn delete(&self, path: &str) -> PortResult<RequestBuilder> {
        Ok(self.http.delete(self.endpoint(path)?))
    }

    /// Attaches the bearer credential to a request.
    pub fn authorized(request: RequestBuilder, credential: &Credential) -> RequestBuilder {
        request.bearer_auth(credential.as_str())
    }

    /// Sends a request, turning transport failures into `PortError::Unexpected`.
    pub async fn send(request: RequestBuilder) -> PortResult<Response> {
        request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("request failed: {}", e)))
    }

    /// Reads a JSON body, mapping error statuses and `{error}` envelopes to `PortError`.
    pub async fn read_json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
        let value = Self::read_value(response).await?;
        serde_json::from_value(value)
            .map_err(|e| PortError::Unexpected(format!("unexpected response shape: {}", e)))
    }

    /// Like [`read_json`](Self::read_json) but discards the body.
    pub async fn read_ok(response: Response) -> PortResult<()> {
        Self::read_value(response).await.map(|_| ())
    }

    /// Reads a raw body, mapping error statuses to `PortError`.
    pub async fn read_bytes(response: Response) -> PortResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to read response body: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn read_value(response: Response) -> PortResult<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| PortError::Unexpected(format!("response is not JSON: {}", e)))?;
        if let Some(message) = error_message(&value) {
            debug!("Backend returned an error envelope with status {}", status);
            return Err(PortError::Rejected(message));
        }
        Ok(value)
    }
}

/// Pulls the human-readable message out of `{error}` or `{detail}` bodies.
fn error_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    ["error", "detail"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn status_error(status: StatusCode, body: &str) -> PortError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(error_message);
    match status {
        StatusCode::UNAUTHORIZED => PortError::Unauthorized,
        StatusCode::NOT_FOUND => {
            PortError::NotFound(message.unwrap_or_else(|| "resource not found".to_string()))
        }
        _ => {
            warn!("Backend request failed with status {}", status);
            PortError::Rejected(message.unwrap_or_else(|| format!("backend returned {}", status)))
        }
    }
}
