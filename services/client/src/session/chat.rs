//! services/client/src/session/chat.rs
//!
//! The chat session controller. It owns the active-document selection and the
//! in-memory history, submits questions and merges answers back in, keeping the
//! selection, the document list and the history consistent while requests are
//! in flight.

use hermes_core::domain::{AnswerPager, HistoryEntry, QuestionRequest};
use hermes_core::ports::{ChatService, PortError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::credential::{AuthError, CredentialStore};
use super::options::OptionsCache;
use super::state::{AnswerView, ChatPhase, SelectionTicket, SessionState};

/// Shown when the backend fails without a message of its own.
pub const ASK_FAILED_MESSAGE: &str = "Error getting answer.";

/// Labels are produced for this many of the most recent history entries.
const HISTORY_LABEL_WINDOW: usize = 5;

/// What happens to a document once a question about it has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumptionPolicy {
    /// The document leaves the selectable list and the selection is cleared.
    #[default]
    ConsumeOnAnswer,
    /// The document stays listed and selected.
    Keep,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Select a document first")]
    NoSelection,
    #[error("Type a question first")]
    EmptyQuestion,
    /// The selection pointed at a document that is gone; it has been cleared.
    #[error("The selected document is no longer available")]
    StaleSelection,
    #[error("A question about this document is already being answered")]
    Busy,
    #[error("No history entry at position {0}")]
    NoSuchEntry(usize),
    #[error("There is no answer to page through")]
    NoAnswer,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Backend(#[from] PortError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    Answered(AnswerView),
    /// Answered, but the selection changed while waiting, so the history was not touched.
    Superseded,
}

pub struct ChatController {
    service: Arc<dyn ChatService>,
    credentials: Arc<CredentialStore>,
    options: Arc<OptionsCache>,
    session: Arc<Mutex<SessionState>>,
    policy: ConsumptionPolicy,
}

impl ChatController {
    pub fn new(
        service: Arc<dyn ChatService>,
        credentials: Arc<CredentialStore>,
        options: Arc<OptionsCache>,
        session: Arc<Mutex<SessionState>>,
        policy: ConsumptionPolicy,
    ) -> Self {
        Self {
            service,
            credentials,
            options,
            session,
            policy,
        }
    }

    pub fn policy(&self) -> ConsumptionPolicy {
        self.policy
    }

    pub async fn selection(&self) -> Option<String> {
        self.session.lock().await.selection().map(str::to_string)
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.session.lock().await.history.clone()
    }

    pub async fn phase(&self) -> ChatPhase {
        self.session.lock().await.chat_phase
    }

    pub async fn last_error(&self) -> Option<String> {
        self.session.lock().await.chat_error.clone()
    }

    pub async fn answer(&self) -> Option<AnswerView> {
        self.session.lock().await.answer.clone()
    }

    //=====================================================================================
    // Selection and History Loading
    //=====================================================================================

    /// Makes `document_id` the active selection and reloads its history.
    ///
    /// An id the registry does not know clears the selection instead.
    pub async fn select_document(&self, document_id: &str) -> Result<(), ChatError> {
        let ticket = {
            let mut session = self.session.lock().await;
            if !session.contains(document_id) {
                debug!("Ignoring selection of unknown document {}", document_id);
                if session.selection().is_some() {
                    session.select(None);
                }
                return Err(ChatError::StaleSelection);
            }
            let ticket = session.select(Some(document_id.to_string()));
            session.settle_chat_phase();
            ticket
        };
        match ticket {
            Some(ticket) => self.reload_history(ticket).await,
            None => Ok(()),
        }
    }

    /// Replaces the history with the server's seed for the ticket's document.
    ///
    /// A result that arrives after the selection moved on is discarded. A failed
    /// fetch leaves the history empty.
    pub async fn reload_history(&self, ticket: SelectionTicket) -> Result<(), ChatError> {
        let credential = self.credentials.require()?;
        let result = self
            .service
            .chat_history(&credential, &ticket.document_id)
            .await;

        let mut session = self.session.lock().await;
        if !session.is_current(&ticket) {
            debug!("Discarding history for {}; selection moved on", ticket.document_id);
            return Ok(());
        }
        session.selected_history = None;
        match result {
            Ok(seed) => {
                debug!("Loaded {} history entries for {}", seed.len(), ticket.document_id);
                session.history = seed;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load history for {}: {}", ticket.document_id, e);
                session.history.clear();
                if self.credentials.observe(&e) {
                    session.teardown();
                }
                Err(ChatError::Backend(e))
            }
        }
    }

    //=====================================================================================
    // Asking
    //=====================================================================================

    /// Submits a question about the active document, as typed.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        let credential = self.credentials.require()?;

        let (ticket, started_in) = {
            let mut session = self.session.lock().await;
            let ticket = session.ticket().ok_or(ChatError::NoSelection)?;
            if !session.contains(&ticket.document_id) {
                session.select(None);
                return Err(ChatError::StaleSelection);
            }
            if !session.asks_in_flight.insert(ticket.document_id.clone()) {
                return Err(ChatError::Busy);
            }
            session.chat_phase = ChatPhase::Submitting;
            session.chat_error = None;
            session.answer = None;
            (ticket, session.session_generation())
        };

        let (answer_format, response_language) = self.options.request_settings().await;
        let request = QuestionRequest {
            question: question.to_string(),
            document_id: ticket.document_id.clone(),
            answer_format,
            response_language,
        };
        info!("Asking about document {}", ticket.document_id);
        let result = self.service.ask(&credential, &request).await;

        let mut session = self.session.lock().await;
        if session.session_generation() != started_in {
            debug!("Discarding reply for {}; its session has ended", ticket.document_id);
            return match result {
                Ok(_) => Ok(AskOutcome::Superseded),
                Err(e) => Err(ChatError::Backend(e)),
            };
        }
        session.asks_in_flight.remove(&ticket.document_id);
        let current = session.is_current(&ticket);
        if !current {
            session.settle_chat_phase();
        }

        match result {
            Ok(reply) => {
                let view = AnswerView {
                    document_id: ticket.document_id.clone(),
                    question: request.question.clone(),
                    pager: AnswerPager::new(reply.answer.clone()),
                    images: reply.images,
                };
                if current {
                    session
                        .history
                        .push(HistoryEntry::new(request.question, reply.answer.to_history_text()));
                    session.answer = Some(view.clone());
                    session.chat_phase = ChatPhase::Answered;
                }
                if self.policy == ConsumptionPolicy::ConsumeOnAnswer {
                    session.remove_document(&ticket.document_id);
                }
                if current {
                    Ok(AskOutcome::Answered(view))
                } else {
                    debug!("Answer for {} arrived after the selection changed", ticket.document_id);
                    Ok(AskOutcome::Superseded)
                }
            }
            Err(e) => {
                error!("Question about {} failed: {}", ticket.document_id, e);
                if current {
                    session.chat_phase = ChatPhase::Failed;
                    session.chat_error = Some(e.user_message(ASK_FAILED_MESSAGE));
                    session.answer = None;
                }
                if self.credentials.observe(&e) {
                    session.teardown();
                }
                Err(ChatError::Backend(e))
            }
        }
    }

    /// Downloads one of the images attached to an answer.
    pub async fn fetch_image(&self, reference: &str) -> Result<Vec<u8>, ChatError> {
        let credential = self.credentials.require()?;
        match self.service.fetch_image(&credential, reference).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                warn!("Failed to download {}: {}", reference, e);
                if self.credentials.observe(&e) {
                    self.session.lock().await.teardown();
                }
                Err(ChatError::Backend(e))
            }
        }
    }

    //=====================================================================================
    // Answer Paging
    //=====================================================================================

    pub async fn next_page(&self) -> Result<String, ChatError> {
        let mut session = self.session.lock().await;
        let view = session.answer.as_mut().ok_or(ChatError::NoAnswer)?;
        Ok(view.pager.next().to_string())
    }

    pub async fn prev_page(&self) -> Result<String, ChatError> {
        let mut session = self.session.lock().await;
        let view = session.answer.as_mut().ok_or(ChatError::NoAnswer)?;
        Ok(view.pager.prev().to_string())
    }

    //=====================================================================================
    // Local History Edits
    //=====================================================================================

    pub async fn select_history_entry(&self, index: usize) -> Result<HistoryEntry, ChatError> {
        let mut session = self.session.lock().await;
        let entry = session
            .history
            .get(index)
            .cloned()
            .ok_or(ChatError::NoSuchEntry(index))?;
        session.selected_history = Some(index);
        Ok(entry)
    }

    pub async fn selected_history_entry(&self) -> Option<(usize, HistoryEntry)> {
        let session = self.session.lock().await;
        session
            .selected_history
            .and_then(|i| session.history.get(i).cloned().map(|e| (i, e)))
    }

    pub async fn delete_history_entry(&self, index: usize) -> Result<HistoryEntry, ChatError> {
        let mut session = self.session.lock().await;
        if index >= session.history.len() {
            return Err(ChatError::NoSuchEntry(index));
        }
        let removed = session.history.remove(index);
        session.selected_history = match session.selected_history {
            Some(selected) if selected == index => None,
            Some(selected) if selected > index => Some(selected - 1),
            other => other,
        };
        Ok(removed)
    }

    pub async fn clear_history(&self) {
        let mut session = self.session.lock().await;
        session.history.clear();
        session.selected_history = None;
    }

    /// Labels for the most recent history entries, oldest first, with their indices.
    pub async fn history_labels(&self) -> Vec<(usize, String)> {
        let session = self.session.lock().await;
        let name = session
            .selection()
            .and_then(|id| session.document(id))
            .map(|d| d.display_name.clone())
            .unwrap_or_else(|| "PDF".to_string());
        let time = chrono::Local::now().format("%H:%M").to_string();
        let start = session.history.len().saturating_sub(HISTORY_LABEL_WINDOW);
        (start..session.history.len())
            .map(|i| (i, format!("{} - Chat {} - {}", name, i + 1, time)))
            .collect()
    }
}
