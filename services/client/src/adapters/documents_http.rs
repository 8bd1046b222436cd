//! services/client/src/adapters/documents_http.rs
//!
//! This module contains the adapter for the backend's document endpoints.
//! It implements the `DocumentService` port from the `core` crate, streaming
//! uploads from disk so that transfer progress can be reported as the body
//! is consumed.

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use hermes_core::domain::{CandidateFile, Credential, DocumentRecord};
use hermes_core::ports::{DocumentService, PortError, PortResult, ProgressReporter};
use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use std::pin::Pin;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use super::http::BackendClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DocumentService` over the REST document endpoints.
#[derive(Clone)]
pub struct HttpDocumentAdapter {
    backend: BackendClient,
}

impl HttpDocumentAdapter {
    /// Creates a new `HttpDocumentAdapter`.
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

#[derive(Deserialize)]
struct StoredDocumentRecord {
    file_id: String,
    filename: String,
}

impl StoredDocumentRecord {
    fn to_domain(self) -> DocumentRecord {
        DocumentRecord {
            id: self.file_id,
            display_name: self.filename,
        }
    }
}

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Wraps a file's byte stream so every chunk handed to the transport is counted.
fn counting_stream(
    chunks: ReaderStream<tokio::fs::File>,
    total: u64,
    progress: ProgressReporter,
) -> ChunkStream {
    Box::pin(stream! {
        let mut sent = 0u64;
        progress(sent, total);
        let mut chunks = chunks;
        while let Some(chunk) = chunks.next().await {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                progress(sent, total);
            }
            yield chunk;
        }
    })
}

//=========================================================================================
// `DocumentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentService for HttpDocumentAdapter {
    async fn list_documents(&self, credential: &Credential) -> PortResult<Vec<DocumentRecord>> {
        let request = BackendClient::authorized(self.backend.get("user-pdfs")?, credential);
        let response = BackendClient::send(request).await?;
        let records: Vec<StoredDocumentRecord> = BackendClient::read_json(response).await?;
        Ok(records.into_iter().map(StoredDocumentRecord::to_domain).collect())
    }

    async fn upload_document(
        &self,
        credential: &Credential,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> PortResult<DocumentRecord> {
        let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
            PortError::Unexpected(format!("cannot open {}: {}", file.path.display(), e))
        })?;
        let total = handle
            .metadata()
            .await
            .map_err(|e| PortError::Unexpected(format!("cannot stat {}: {}", file.path.display(), e)))?
            .len();
        debug!("Streaming {} bytes for upload of '{}'", total, file.name);

        let body = Body::wrap_stream(counting_stream(ReaderStream::new(handle), total, progress));
        let part = Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str("application/pdf")
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request =
            BackendClient::authorized(self.backend.post("upload-pdf")?, credential).multipart(form);
        let response = BackendClient::send(request).await?;
        let record: StoredDocumentRecord = BackendClient::read_json(response).await?;

        info!("Upload of '{}' registered as {}", record.filename, record.file_id);
        Ok(record.to_domain())
    }

    async fn delete_document(&self, credential: &Credential, document_id: &str) -> PortResult<()> {
        let request = BackendClient::authorized(self.backend.delete("delete-pdf")?, credential)
            .query(&[("file_id", document_id)]);
        let response = BackendClient::send(request).await?;
        BackendClient::read_ok(response).await
    }
}
