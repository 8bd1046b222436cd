pub mod chat;
pub mod credential;
pub mod notice;
pub mod onboarding;
pub mod options;
pub mod registry;
pub mod state;
pub mod upload;
pub mod workbench;

// Re-export the pieces a front end needs to drive a session.
pub use chat::{AskOutcome, ChatController, ChatError, ConsumptionPolicy};
pub use credential::{AuthError, CredentialStore, Route};
pub use notice::{Notice, Notices};
pub use onboarding::{OnboardingSequencer, OnboardingState, TUTORIAL_STEPS};
pub use options::{ChatOptions, OptionsCache, OptionsError};
pub use registry::{DocumentRegistry, RegistryError};
pub use state::{AnswerView, AppState, ChatPhase, SelectionTicket, SessionState, UploadStatus};
pub use upload::{UploadError, UploadPipeline, UploadReceipt};
pub use workbench::Workbench;
