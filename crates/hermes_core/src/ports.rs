//! crates/hermes_core/src/ports.rs
//!
//! Defines the service contracts (traits) the session controllers depend on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! controllers independent of the HTTP backend and of the storage medium.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{CandidateFile, ChatReply, Credential, DocumentRecord, HistoryEntry, QuestionRequest};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backend refused the bearer credential.
    #[error("Unauthorized")]
    Unauthorized,
    /// The backend answered with an explicit error message.
    #[error("{0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The message to show the user, preferring what the backend said.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PortError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            PortError::NotFound(message) if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Receives `(bytes_sent, bytes_total)` while an upload is in flight.
pub type ProgressReporter = Arc<dyn Fn(u64, u64) + Send + Sync>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchanges a username and password for a bearer credential.
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<Credential>;

    async fn register(&self, username: &str, password: &str) -> PortResult<()>;
}

#[async_trait]
pub trait OptionsService: Send + Sync {
    async fn list_languages(&self) -> PortResult<Vec<String>>;

    async fn list_answer_formats(&self) -> PortResult<Vec<String>>;
}

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Lists the documents owned by the credential's user, in backend order.
    async fn list_documents(&self, credential: &Credential) -> PortResult<Vec<DocumentRecord>>;

    /// Transmits a staged file, reporting progress as the body is sent.
    async fn upload_document(
        &self,
        credential: &Credential,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> PortResult<DocumentRecord>;

    async fn delete_document(&self, credential: &Credential, document_id: &str) -> PortResult<()>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Fetches the stored question/answer pairs for one document.
    async fn chat_history(
        &self,
        credential: &Credential,
        document_id: &str,
    ) -> PortResult<Vec<HistoryEntry>>;

    async fn ask(&self, credential: &Credential, request: &QuestionRequest) -> PortResult<ChatReply>;

    /// Downloads an image referenced by an answer.
    async fn fetch_image(&self, credential: &Credential, reference: &str) -> PortResult<Vec<u8>>;
}

/// Durable per-installation key/value storage that survives reloads.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> PortResult<()>;

    fn remove(&self, key: &str) -> PortResult<()>;
}
