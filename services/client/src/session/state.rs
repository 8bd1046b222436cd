//! services/client/src/session/state.rs
//!
//! Defines the client's shared service handles and the session-scoped state
//! that the registry, the upload pipeline and the chat controller mutate.

use hermes_core::domain::{AnswerPager, DocumentRecord, HistoryEntry, UploadCandidate};
use hermes_core::ports::{AuthService, ChatService, DocumentService, DurableStorage, OptionsService};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

//=========================================================================================
// AppState (Shared Across All Components)
//=========================================================================================

/// The backend and storage handles, created once at startup and passed to every component.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<dyn AuthService>,
    pub options: Arc<dyn OptionsService>,
    pub documents: Arc<dyn DocumentService>,
    pub chat: Arc<dyn ChatService>,
    pub storage: Arc<dyn DurableStorage>,
}

//=========================================================================================
// SessionState (Specific to One Signed-In Session)
//=========================================================================================

/// Identifies the selection a suspended request was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub document_id: String,
    pub epoch: u64,
}

/// Where the chat controller is in its per-question cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Submitting,
    Answered,
    Failed,
}

/// The most recent answer, ready for paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub document_id: String,
    pub question: String,
    pub pager: AnswerPager,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Uploaded,
    Failed(String),
}

/// All mutable state of one signed-in session.
///
/// Every mutation is a whole-list replacement or a single-record removal, and
/// each one that touches the document list re-checks the selection invariant.
///
/// The epoch and generation counters only ever grow, across sign-outs too, so a
/// request issued in one session never looks current in the next.
pub struct SessionState {
    documents: Vec<DocumentRecord>,
    selection: Option<String>,
    selection_epoch: u64,
    refresh_generation: u64,
    session_generation: u64,

    pub history: Vec<HistoryEntry>,
    pub selected_history: Option<usize>,
    pub answer: Option<AnswerView>,
    pub chat_phase: ChatPhase,
    pub chat_error: Option<String>,
    pub asks_in_flight: HashSet<String>,

    pub candidate: Option<UploadCandidate>,
    pub upload_status: UploadStatus,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            selection: None,
            selection_epoch: 0,
            refresh_generation: 0,
            session_generation: 0,
            history: Vec::new(),
            selected_history: None,
            answer: None,
            chat_phase: ChatPhase::Idle,
            chat_error: None,
            asks_in_flight: HashSet::new(),
            candidate: None,
            upload_status: UploadStatus::Idle,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything scoped to the signed-in session.
    pub fn teardown(&mut self) {
        *self = Self {
            selection_epoch: self.selection_epoch + 1,
            refresh_generation: self.refresh_generation + 1,
            session_generation: self.session_generation + 1,
            ..Self::default()
        };
    }

    /// Identifies the session; it changes on every teardown.
    pub fn session_generation(&self) -> u64 {
        self.session_generation
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.documents.iter().any(|d| d.id == document_id)
    }

    pub fn document(&self, document_id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// The ticket for the current selection, if any.
    pub fn ticket(&self) -> Option<SelectionTicket> {
        self.selection.as_ref().map(|id| SelectionTicket {
            document_id: id.clone(),
            epoch: self.selection_epoch,
        })
    }

    /// Changes the selection and returns the ticket requests should carry.
    pub fn select(&mut self, document_id: Option<String>) -> Option<SelectionTicket> {
        self.selection_epoch += 1;
        self.selection = document_id;
        self.selected_history = None;
        self.ticket()
    }

    /// True while the selection a request was issued under is still in effect.
    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.selection_epoch == ticket.epoch
            && self.selection.as_deref() == Some(ticket.document_id.as_str())
    }

    /// Puts the chat cycle back where the current selection leaves it: waiting
    /// if that document still has a question out, idle otherwise.
    pub fn settle_chat_phase(&mut self) {
        let waiting = self
            .selection
            .as_ref()
            .is_some_and(|id| self.asks_in_flight.contains(id));
        self.chat_phase = if waiting {
            ChatPhase::Submitting
        } else {
            ChatPhase::Idle
        };
        self.chat_error = None;
    }

    /// Starts a registry refresh and returns its generation.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_generation += 1;
        self.refresh_generation
    }

    pub fn is_latest_refresh(&self, generation: u64) -> bool {
        self.refresh_generation == generation
    }

    /// Replaces the document list, clearing a selection that no longer resolves.
    pub fn replace_documents(&mut self, documents: Vec<DocumentRecord>) {
        self.documents = documents;
        if let Some(selected) = self.selection.clone() {
            if !self.contains(&selected) {
                debug!("Selection {} vanished from the registry; clearing it", selected);
                self.select(None);
            }
        }
    }

    /// Removes one record, clearing the selection if it pointed at it.
    pub fn remove_document(&mut self, document_id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != document_id);
        if self.selection.as_deref() == Some(document_id) {
            self.select(None);
        }
        self.documents.len() != before
    }
}

/// Collapses records sharing a display name; the last listed record wins and
/// takes the position of the first occurrence.
pub fn dedupe_by_display_name(records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<DocumentRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.display_name) {
            Some(&index) => unique[index] = record,
            None => {
                positions.insert(record.display_name.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}
