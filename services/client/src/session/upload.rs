//! services/client/src/session/upload.rs
//!
//! The upload pipeline: stages a local file, validates it without touching
//! the network, transmits it with progress reporting and registers the result.

use hermes_core::domain::{CandidateFile, CandidateVerdict, DocumentRecord, RejectReason, UploadCandidate};
use hermes_core::ports::{DocumentService, PortError, ProgressReporter};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use super::credential::{AuthError, CredentialStore};
use super::notice::Notices;
use super::registry::DocumentRegistry;
use super::state::{SelectionTicket, SessionState, UploadStatus};

pub const REJECTED_FILE_NOTICE: &str = "Only PDFs under 500MB allowed";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("File rejected: {0}")]
    Rejected(RejectReason),
    #[error("Cannot read {0}")]
    Unreadable(String),
    #[error("No file is staged")]
    NothingStaged,
    #[error("An upload is already in progress")]
    InFlight,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Backend(#[from] PortError),
}

/// What a successful submission produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub record: DocumentRecord,
    /// The selection made for the new document, for the history reload.
    pub ticket: Option<SelectionTicket>,
}

pub struct UploadPipeline {
    service: Arc<dyn DocumentService>,
    credentials: Arc<CredentialStore>,
    registry: Arc<DocumentRegistry>,
    notices: Arc<Notices>,
    session: Arc<Mutex<SessionState>>,
    progress: Arc<watch::Sender<u8>>,
}

/// Converts transferred bytes to a whole percentage in `[0, 100]`.
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (sent.min(total).saturating_mul(100) / total) as u8
}

impl UploadPipeline {
    pub fn new(
        service: Arc<dyn DocumentService>,
        credentials: Arc<CredentialStore>,
        registry: Arc<DocumentRegistry>,
        notices: Arc<Notices>,
        session: Arc<Mutex<SessionState>>,
    ) -> Self {
        let (progress, _) = watch::channel(0u8);
        Self {
            service,
            credentials,
            registry,
            notices,
            session,
            progress: Arc::new(progress),
        }
    }

    /// The live transfer percentage.
    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<u8> {
        self.progress.subscribe()
    }

    pub async fn candidate(&self) -> Option<UploadCandidate> {
        self.session.lock().await.candidate.clone()
    }

    pub async fn status(&self) -> UploadStatus {
        self.session.lock().await.upload_status.clone()
    }

    /// Validates and stages a file. A rejected file leaves the current candidate in place.
    pub async fn stage(&self, file: CandidateFile) -> Result<UploadCandidate, UploadError> {
        let candidate = UploadCandidate::new(file);
        if let CandidateVerdict::Rejected(reason) = candidate.verdict {
            warn!("Rejected '{}': {}", candidate.file.name, reason);
            self.notices.post(REJECTED_FILE_NOTICE);
            return Err(UploadError::Rejected(reason));
        }

        let mut session = self.session.lock().await;
        if session.upload_status == UploadStatus::Uploading {
            return Err(UploadError::InFlight);
        }
        session.candidate = Some(candidate.clone());
        session.upload_status = UploadStatus::Idle;
        self.progress.send_replace(0);
        info!("Staged '{}' ({} bytes)", candidate.file.name, candidate.file.size_bytes);
        Ok(candidate)
    }

    /// Stages a file from disk, reading only its local metadata.
    pub async fn stage_path(&self, path: &Path) -> Result<UploadCandidate, UploadError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::Unreadable(format!("{}: {}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(UploadError::Unreadable(format!("{} is not a file", path.display())));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.stage(CandidateFile {
            name,
            size_bytes: metadata.len(),
            path: path.to_path_buf(),
        })
        .await
    }

    /// Transmits the staged candidate.
    ///
    /// On success the new document becomes the selection, the candidate is
    /// cleared and the registry refreshed. On failure the candidate stays staged
    /// with progress back at zero so the user can retry. If the session ended
    /// while the file was in transit, the result is reported but nothing of the
    /// new session is touched.
    pub async fn submit(&self) -> Result<UploadReceipt, UploadError> {
        let credential = self.credentials.require()?;

        let (candidate, started_in) = {
            let mut session = self.session.lock().await;
            if session.upload_status == UploadStatus::Uploading {
                return Err(UploadError::InFlight);
            }
            let candidate = session.candidate.clone().ok_or(UploadError::NothingStaged)?;
            session.upload_status = UploadStatus::Uploading;
            if let Some(staged) = session.candidate.as_mut() {
                staged.progress = 0;
            }
            (candidate, session.session_generation())
        };
        self.progress.send_replace(0);

        let sender = self.progress.clone();
        let reporter: ProgressReporter = Arc::new(move |sent, total| {
            let pct = percent(sent, total);
            sender.send_if_modified(|current| {
                if pct > *current {
                    *current = pct;
                    true
                } else {
                    false
                }
            });
        });

        info!("Uploading '{}'", candidate.file.name);
        let result = self
            .service
            .upload_document(&credential, &candidate.file, reporter)
            .await;

        let mut session = self.session.lock().await;
        if session.session_generation() != started_in {
            info!("Upload of '{}' finished after its session ended", candidate.file.name);
            return match result {
                Ok(record) => Ok(UploadReceipt { record, ticket: None }),
                Err(e) => Err(UploadError::Backend(e)),
            };
        }

        match result {
            Ok(record) => {
                if session.candidate.as_ref().map(|c| &c.file) == Some(&candidate.file) {
                    session.candidate = None;
                }
                session.upload_status = UploadStatus::Uploaded;
                let ticket = session.select(Some(record.id.clone()));
                session.settle_chat_phase();
                drop(session);
                self.progress.send_replace(100);
                info!("Uploaded '{}' as {}", record.display_name, record.id);

                if let Err(e) = self.registry.refresh().await {
                    warn!("Registry refresh after upload failed: {}", e);
                }
                Ok(UploadReceipt { record, ticket })
            }
            Err(e) => {
                error!("Upload of '{}' failed: {}", candidate.file.name, e);
                session.upload_status = UploadStatus::Failed(e.user_message("Upload failed"));
                if let Some(staged) = session.candidate.as_mut() {
                    staged.progress = 0;
                }
                if self.credentials.observe(&e) {
                    session.teardown();
                }
                drop(session);
                self.progress.send_replace(0);
                Err(UploadError::Backend(e))
            }
        }
    }
}
