#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use hermes_core::domain::{
    Answer, CandidateFile, ChatReply, Credential, DocumentRecord, HistoryEntry, QuestionRequest,
};
use hermes_core::ports::{
    AuthService, ChatService, DocumentService, OptionsService, PortError, PortResult,
    ProgressReporter,
};
use parking_lot::Mutex;
use tokio::sync::{watch, Notify};

use client_lib::adapters::MemoryStorage;
use client_lib::session::{AppState, ConsumptionPolicy, Workbench};

pub const PASSWORD: &str = "secret";

/// One in-memory backend standing in for every service port.
///
/// Each `fail_*` slot makes the matching call fail with the stored error.
/// Gates hold a call open until the test releases it.
#[derive(Default)]
pub struct FakeBackend {
    pub documents: Mutex<Vec<DocumentRecord>>,
    pub histories: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    pub reply: Mutex<Option<ChatReply>>,
    pub taken_usernames: Mutex<HashSet<String>>,

    pub fail_options: Mutex<Option<PortError>>,
    pub fail_list: Mutex<Option<PortError>>,
    pub fail_delete: Mutex<Option<PortError>>,
    pub fail_upload: Mutex<Option<PortError>>,
    pub fail_history: Mutex<Option<PortError>>,
    pub fail_ask: Mutex<Option<PortError>>,

    pub ask_gate: Mutex<Option<Arc<Notify>>>,
    pub upload_gate: Mutex<Option<Arc<Notify>>>,
    pub history_gates: Mutex<HashMap<String, Arc<Notify>>>,

    /// Upload progress calls as `(sent, total)`; defaults to 0, half, all.
    pub upload_steps: Mutex<Option<Vec<(u64, u64)>>>,
    /// When set, the published percentage is sampled after every progress call.
    pub progress_probe: Mutex<Option<watch::Receiver<u8>>>,
    pub observed_progress: Mutex<Vec<u8>>,

    pub calls: Mutex<Vec<String>>,
    pub asked: Mutex<Vec<QuestionRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_documents(records: &[(&str, &str)]) -> Arc<Self> {
        let backend = Self::default();
        *backend.documents.lock() = records
            .iter()
            .map(|(id, name)| DocumentRecord::new(*id, *name))
            .collect();
        Arc::new(backend)
    }

    pub fn seed_history(&self, document_id: &str, entries: &[(&str, &str)]) {
        self.histories.lock().insert(
            document_id.to_string(),
            entries
                .iter()
                .map(|(q, a)| HistoryEntry::new(*q, *a))
                .collect(),
        );
    }

    pub fn gate_ask(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.ask_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn gate_upload(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.upload_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn gate_history(&self, document_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.history_gates
            .lock()
            .insert(document_id.to_string(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().push(name.to_string());
    }

    fn check(slot: &Mutex<Option<PortError>>) -> PortResult<()> {
        match slot.lock().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthService for FakeBackend {
    async fn authenticate(&self, username: &str, password: &str) -> PortResult<Credential> {
        self.record("authenticate");
        if password != PASSWORD {
            return Err(PortError::Rejected("Incorrect username or password".into()));
        }
        Ok(Credential::new(format!("token-{}", username)))
    }

    async fn register(&self, username: &str, _password: &str) -> PortResult<()> {
        self.record("register");
        if !self.taken_usernames.lock().insert(username.to_string()) {
            return Err(PortError::Rejected("Username already registered".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OptionsService for FakeBackend {
    async fn list_languages(&self) -> PortResult<Vec<String>> {
        self.record("list_languages");
        Self::check(&self.fail_options)?;
        Ok(vec!["English".into(), "French".into()])
    }

    async fn list_answer_formats(&self) -> PortResult<Vec<String>> {
        self.record("list_answer_formats");
        Self::check(&self.fail_options)?;
        Ok(vec!["points".into(), "paragraph".into()])
    }
}

#[async_trait]
impl DocumentService for FakeBackend {
    async fn list_documents(&self, _credential: &Credential) -> PortResult<Vec<DocumentRecord>> {
        self.record("list_documents");
        Self::check(&self.fail_list)?;
        Ok(self.documents.lock().clone())
    }

    async fn upload_document(
        &self,
        _credential: &Credential,
        file: &CandidateFile,
        progress: ProgressReporter,
    ) -> PortResult<DocumentRecord> {
        self.record("upload_document");
        let gate = self.upload_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let total = file.size_bytes;
        let steps = self
            .upload_steps
            .lock()
            .clone()
            .unwrap_or_else(|| vec![(0, total), (total / 2, total), (total, total)]);
        let probe = self.progress_probe.lock().clone();
        for (sent, total) in steps {
            progress(sent, total);
            if let Some(probe) = &probe {
                self.observed_progress.lock().push(*probe.borrow());
            }
        }
        Self::check(&self.fail_upload)?;

        let record = DocumentRecord::new(format!("id-{}", file.name), file.name.clone());
        self.documents.lock().push(record.clone());
        Ok(record)
    }

    async fn delete_document(&self, _credential: &Credential, document_id: &str) -> PortResult<()> {
        self.record("delete_document");
        Self::check(&self.fail_delete)?;
        self.documents.lock().retain(|d| d.id != document_id);
        Ok(())
    }
}

#[async_trait]
impl ChatService for FakeBackend {
    async fn chat_history(
        &self,
        _credential: &Credential,
        document_id: &str,
    ) -> PortResult<Vec<HistoryEntry>> {
        self.record(&format!("chat_history:{}", document_id));
        let gate = self.history_gates.lock().get(document_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::check(&self.fail_history)?;
        Ok(self
            .histories
            .lock()
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn ask(&self, _credential: &Credential, request: &QuestionRequest) -> PortResult<ChatReply> {
        self.record("ask");
        self.asked.lock().push(request.clone());
        let gate = self.ask_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Self::check(&self.fail_ask)?;
        Ok(self.reply.lock().clone().unwrap_or_else(|| ChatReply {
            answer: Answer::Single(format!("Answer to: {}", request.question)),
            images: Vec::new(),
        }))
    }

    async fn fetch_image(&self, _credential: &Credential, reference: &str) -> PortResult<Vec<u8>> {
        self.record("fetch_image");
        Ok(reference.as_bytes().to_vec())
    }
}

pub fn app_state(backend: &Arc<FakeBackend>) -> AppState {
    AppState {
        auth: backend.clone(),
        options: backend.clone(),
        documents: backend.clone(),
        chat: backend.clone(),
        storage: Arc::new(MemoryStorage::new()),
    }
}

/// A workbench already signed in, with its first document list loaded.
pub async fn signed_in(backend: &Arc<FakeBackend>, policy: ConsumptionPolicy) -> Arc<Workbench> {
    let workbench = Arc::new(Workbench::new(app_state(backend), policy));
    workbench.options.load().await;
    workbench
        .login(Credential::new("token"))
        .await
        .expect("initial document load");
    workbench
}
