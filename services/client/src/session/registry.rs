//! services/client/src/session/registry.rs
//!
//! The document registry: the local view of the user's uploaded documents,
//! kept in step with the backend on list and delete.

use hermes_core::domain::DocumentRecord;
use hermes_core::ports::{DocumentService, PortError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::credential::{AuthError, CredentialStore};
use super::notice::Notices;
use super::state::{dedupe_by_display_name, SelectionTicket, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Document service failed: {0}")]
    Backend(#[from] PortError),
}

pub struct DocumentRegistry {
    service: Arc<dyn DocumentService>,
    credentials: Arc<CredentialStore>,
    notices: Arc<Notices>,
    session: Arc<Mutex<SessionState>>,
}

impl DocumentRegistry {
    pub fn new(
        service: Arc<dyn DocumentService>,
        credentials: Arc<CredentialStore>,
        notices: Arc<Notices>,
        session: Arc<Mutex<SessionState>>,
    ) -> Self {
        Self {
            service,
            credentials,
            notices,
            session,
        }
    }

    pub async fn documents(&self) -> Vec<DocumentRecord> {
        self.session.lock().await.documents().to_vec()
    }

    /// Replaces the local list with the backend's, deduplicated by display name.
    ///
    /// On failure the local list is emptied rather than left stale.
    pub async fn refresh(&self) -> Result<Vec<DocumentRecord>, RegistryError> {
        let credential = self.credentials.require()?;
        let generation = self.session.lock().await.begin_refresh();

        let result = self.service.list_documents(&credential).await;

        let mut session = self.session.lock().await;
        if !session.is_latest_refresh(generation) {
            debug!("Discarding superseded document list (generation {})", generation);
            return match result {
                Ok(_) => Ok(session.documents().to_vec()),
                Err(e) => Err(RegistryError::Backend(e)),
            };
        }
        match result {
            Ok(records) => {
                let unique = dedupe_by_display_name(records);
                info!("Registry refreshed with {} document(s)", unique.len());
                session.replace_documents(unique);
                Ok(session.documents().to_vec())
            }
            Err(e) => {
                error!("Failed to list documents: {}", e);
                session.replace_documents(Vec::new());
                if self.credentials.observe(&e) {
                    session.teardown();
                }
                Err(RegistryError::Backend(e))
            }
        }
    }

    /// The first refresh of a session: when nothing is selected yet, the first
    /// listed document becomes the selection. Returns its ticket if one was made.
    pub async fn initial_load(&self) -> Result<Option<SelectionTicket>, RegistryError> {
        let started_in = self.session.lock().await.session_generation();
        self.refresh().await?;
        let mut session = self.session.lock().await;
        if session.session_generation() != started_in || session.selection().is_some() {
            return Ok(None);
        }
        let first = session.documents().first().map(|d| d.id.clone());
        Ok(first.and_then(|id| session.select(Some(id))))
    }

    /// Deletes a document remotely, then locally. A failure leaves the list untouched.
    pub async fn remove(&self, document_id: &str) -> Result<(), RegistryError> {
        let credential = self.credentials.require()?;
        match self.service.delete_document(&credential, document_id).await {
            Ok(()) => {
                let mut session = self.session.lock().await;
                session.remove_document(document_id);
                info!("Deleted document {}", document_id);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete document {}: {}", document_id, e);
                if self.credentials.observe(&e) {
                    self.session.lock().await.teardown();
                }
                self.notices.post("Failed to delete PDF");
                Err(RegistryError::Backend(e))
            }
        }
    }
}
