//! services/client/src/adapters/chat_http.rs
//!
//! This module contains the adapter for question answering and chat history.
//! It implements the `ChatService` port from the `core` crate.

use async_trait::async_trait;
use hermes_core::domain::{Answer, ChatReply, Credential, HistoryEntry, QuestionRequest};
use hermes_core::ports::{ChatService, PortResult};
use reqwest::multipart::Form;
use serde::Deserialize;
use tracing::info;

use super::http::BackendClient;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ChatService` over `/chat`, `/chat-history` and `/pdf-image`.
#[derive(Clone)]
pub struct HttpChatAdapter {
    backend: BackendClient,
}

impl HttpChatAdapter {
    /// Creates a new `HttpChatAdapter`.
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

//=========================================================================================
// Wire Records
//=========================================================================================

/// The backend sends either a plain string or a list of pages.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerRecord {
    Single(String),
    Paginated(Vec<String>),
}

impl AnswerRecord {
    fn to_domain(self) -> Answer {
        match self {
            AnswerRecord::Single(text) => Answer::Single(text),
            AnswerRecord::Paginated(pages) => Answer::from_pages(pages),
        }
    }
}

#[derive(Deserialize)]
struct ChatReplyRecord {
    answer: AnswerRecord,
    #[serde(default)]
    images: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct HistoryRecord {
    question: String,
    answer: AnswerRecord,
}

impl HistoryRecord {
    fn to_domain(self) -> HistoryEntry {
        HistoryEntry {
            question: self.question,
            answer: self.answer.to_domain().to_history_text(),
        }
    }
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for HttpChatAdapter {
    async fn chat_history(
        &self,
        credential: &Credential,
        document_id: &str,
    ) -> PortResult<Vec<HistoryEntry>> {
        let request = BackendClient::authorized(self.backend.get("chat-history")?, credential)
            .query(&[("file_id", document_id)]);
        let response = BackendClient::send(request).await?;
        let records: Vec<HistoryRecord> = BackendClient::read_json(response).await?;
        Ok(records.into_iter().map(HistoryRecord::to_domain).collect())
    }

    async fn ask(&self, credential: &Credential, request: &QuestionRequest) -> PortResult<ChatReply> {
        let form = Form::new()
            .text("question", request.question.clone())
            .text("file_id", request.document_id.clone())
            .text("answer_format", request.answer_format.clone())
            .text("response_language", request.response_language.clone());

        let http_request =
            BackendClient::authorized(self.backend.post("chat")?, credential).multipart(form);
        let response = BackendClient::send(http_request).await?;
        let record: ChatReplyRecord = BackendClient::read_json(response).await?;

        let images = record.images.unwrap_or_default();
        info!(
            "Answer received for document {} with {} image(s)",
            request.document_id,
            images.len()
        );
        Ok(ChatReply {
            answer: record.answer.to_domain(),
            images,
        })
    }

    async fn fetch_image(&self, credential: &Credential, reference: &str) -> PortResult<Vec<u8>> {
        let request = BackendClient::authorized(self.backend.get(reference)?, credential);
        let response = BackendClient::send(request).await?;
        BackendClient::read_bytes(response).await
    }
}
