//! services/client/src/adapters/options_http.rs
//!
//! Adapter for the unauthenticated option enumerations.

use async_trait::async_trait;
use hermes_core::ports::{OptionsService, PortResult};

use super::http::BackendClient;

/// Implements `OptionsService` over `GET /options/*`.
#[derive(Clone)]
pub struct HttpOptionsAdapter {
    backend: BackendClient,
}

impl HttpOptionsAdapter {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    async fn fetch_list(&self, path: &str) -> PortResult<Vec<String>> {
        let response = BackendClient::send(self.backend.get(path)?).await?;
        BackendClient::read_json(response).await
    }
}

#[async_trait]
impl OptionsService for HttpOptionsAdapter {
    async fn list_languages(&self) -> PortResult<Vec<String>> {
        self.fetch_list("options/languages").await
    }

    async fn list_answer_formats(&self) -> PortResult<Vec<String>> {
        self.fetch_list("options/answer-formats").await
    }
}
