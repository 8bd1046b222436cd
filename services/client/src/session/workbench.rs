//! services/client/src/session/workbench.rs
//!
//! Wires the components together and runs the operations that span more
//! than one of them: session start-up, sign-in, sign-out and uploads that
//! change the selection.

use hermes_core::domain::{Credential, DocumentRecord};
use parking_lot::Mutex as SyncMutex;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::chat::{ChatController, ConsumptionPolicy};
use super::credential::{AuthError, CredentialStore};
use super::notice::Notices;
use super::onboarding::OnboardingSequencer;
use super::options::OptionsCache;
use super::registry::{DocumentRegistry, RegistryError};
use super::state::{AppState, SessionState};
use super::upload::{UploadError, UploadPipeline, UploadReceipt};

pub struct Workbench {
    app: AppState,
    pub credentials: Arc<CredentialStore>,
    pub options: Arc<OptionsCache>,
    pub registry: Arc<DocumentRegistry>,
    pub uploads: UploadPipeline,
    pub chat: ChatController,
    pub notices: Arc<Notices>,
    pub onboarding: SyncMutex<OnboardingSequencer>,
    session: Arc<Mutex<SessionState>>,
}

impl Workbench {
    /// Builds every component over the given services, loading persisted state.
    pub fn new(app: AppState, policy: ConsumptionPolicy) -> Self {
        let credentials = Arc::new(CredentialStore::load(app.storage.clone()));
        let notices = Arc::new(Notices::new());
        let session = Arc::new(Mutex::new(SessionState::new()));
        let options = Arc::new(OptionsCache::new(app.options.clone()));
        let registry = Arc::new(DocumentRegistry::new(
            app.documents.clone(),
            credentials.clone(),
            notices.clone(),
            session.clone(),
        ));
        let uploads = UploadPipeline::new(
            app.documents.clone(),
            credentials.clone(),
            registry.clone(),
            notices.clone(),
            session.clone(),
        );
        let chat = ChatController::new(
            app.chat.clone(),
            credentials.clone(),
            options.clone(),
            session.clone(),
            policy,
        );
        let onboarding = SyncMutex::new(OnboardingSequencer::start(app.storage.clone()));

        Self {
            app,
            credentials,
            options,
            registry,
            uploads,
            chat,
            notices,
            onboarding,
            session,
        }
    }

    /// Loads the option enumerations and, when signed in, the document list.
    pub async fn start(&self) -> Result<(), RegistryError> {
        self.options.load().await;
        if !self.credentials.is_authenticated() {
            return Ok(());
        }
        self.load_documents().await
    }

    /// Signs in and loads the new session's documents.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.credentials
            .authenticate(self.app.auth.as_ref(), username, password)
            .await?;
        self.session.lock().await.teardown();
        if let Err(e) = self.load_documents().await {
            warn!("Could not load documents after sign-in: {}", e);
        }
        Ok(())
    }

    /// Signs in with an already issued credential.
    pub async fn login(&self, credential: Credential) -> Result<(), RegistryError> {
        self.credentials.login(credential);
        self.session.lock().await.teardown();
        self.load_documents().await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        self.credentials
            .register(self.app.auth.as_ref(), username, password)
            .await
    }

    /// Clears the credential and everything scoped to the session.
    pub async fn logout(&self) {
        self.credentials.logout();
        self.session.lock().await.teardown();
        info!("Signed out");
    }

    /// Sends the staged file and loads the history of the document it became.
    pub async fn upload(&self) -> Result<UploadReceipt, UploadError> {
        let receipt = self.uploads.submit().await?;
        if let Some(ticket) = receipt.ticket.clone() {
            if let Err(e) = self.chat.reload_history(ticket).await {
                warn!("Could not load history for the uploaded document: {}", e);
            }
        }
        Ok(receipt)
    }

    pub async fn documents(&self) -> Vec<DocumentRecord> {
        self.registry.documents().await
    }

    async fn load_documents(&self) -> Result<(), RegistryError> {
        if let Some(ticket) = self.registry.initial_load().await? {
            if let Err(e) = self.chat.reload_history(ticket).await {
                warn!("Could not load history for the first document: {}", e);
            }
        }
        Ok(())
    }
}
