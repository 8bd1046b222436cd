//! services/client/src/adapters/auth_http.rs
//!
//! This module contains the adapter for the backend's account endpoints.
//! It implements the `AuthService` port from the `core` crate.

use async_trait::async_trait;
use hermes_core::domain::Credential;
use hermes_core::ports::{AuthService, PortError, PortResult};
use serde::Deserialize;

use super::http::BackendClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AuthService` over `POST /token` and `POST /register`.
#[derive(Clone)]
pub struct HttpAuthAdapter {
    backend: BackendClient,
}

impl HttpAuthAdapter {
    /// Creates a new `HttpAuthAdapter`.
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[derive(Deserialize)]
struct TokenRecord {
    access_token: String,
}

//=========================================================================================
// `AuthService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthService for HttpAuthAdapter {
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<Credential> {
        let request = self
            .backend
            .post("token")?
            .form(&[("username", username), ("password", password)]);
        let response = BackendClient::send(request).await?;
        let record: TokenRecord = BackendClient::read_json(response).await?;

        if record.access_token.trim().is_empty() {
            return Err(PortError::Unexpected("backend issued an empty token".to_string()));
        }
        Ok(Credential::new(record.access_token))
    }

    async fn register(&self, username: &str, password: &str) -> PortResult<()> {
        let request = self
            .backend
            .post("register")?
            .form(&[("username", username), ("password", password)]);
        let response = BackendClient::send(request).await?;
        BackendClient::read_ok(response).await
    }
}
