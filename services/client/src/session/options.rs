//! services/client/src/session/options.rs
//!
//! Caches the backend's option enumerations for the session, together with
//! the answer format and response language the user has picked.

use hermes_core::ports::OptionsService;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const DEFAULT_LANGUAGE: &str = "English";
pub const DEFAULT_ANSWER_FORMAT: &str = "points";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOptions {
    pub languages: Vec<String>,
    pub answer_formats: Vec<String>,
    pub answer_format: String,
    pub response_language: String,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            languages: vec![DEFAULT_LANGUAGE.to_string()],
            answer_formats: vec![DEFAULT_ANSWER_FORMAT.to_string()],
            answer_format: DEFAULT_ANSWER_FORMAT.to_string(),
            response_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("'{0}' is not an offered answer format")]
    UnknownFormat(String),
    #[error("'{0}' is not an offered language")]
    UnknownLanguage(String),
}

#[derive(Default)]
struct OptionsSlot {
    options: ChatOptions,
    loaded: bool,
}

pub struct OptionsCache {
    service: Arc<dyn OptionsService>,
    slot: Mutex<OptionsSlot>,
}

impl OptionsCache {
    pub fn new(service: Arc<dyn OptionsService>) -> Self {
        Self {
            service,
            slot: Mutex::new(OptionsSlot::default()),
        }
    }

    /// Fetches the enumerations the first time it is called; later calls reuse them.
    ///
    /// A failed fetch keeps the defaults and is retried on the next call.
    pub async fn load(&self) -> ChatOptions {
        // Held across the fetch so concurrent callers wait for one request.
        let mut slot = self.slot.lock().await;
        if slot.loaded {
            return slot.options.clone();
        }

        let (languages, formats) = futures::join!(
            self.service.list_languages(),
            self.service.list_answer_formats()
        );

        let mut complete = true;
        match languages {
            Ok(languages) if !languages.is_empty() => slot.options.languages = languages,
            Ok(_) => warn!("Backend offered no languages; keeping defaults"),
            Err(e) => {
                warn!("Failed to load languages: {}", e);
                complete = false;
            }
        }
        match formats {
            Ok(formats) if !formats.is_empty() => slot.options.answer_formats = formats,
            Ok(_) => warn!("Backend offered no answer formats; keeping defaults"),
            Err(e) => {
                warn!("Failed to load answer formats: {}", e);
                complete = false;
            }
        }
        slot.loaded = complete;
        if complete {
            info!(
                "Loaded {} languages and {} answer formats",
                slot.options.languages.len(),
                slot.options.answer_formats.len()
            );
        }
        slot.options.clone()
    }

    pub async fn snapshot(&self) -> ChatOptions {
        self.slot.lock().await.options.clone()
    }

    /// The `(answer_format, response_language)` pair a question is sent with.
    pub async fn request_settings(&self) -> (String, String) {
        let slot = self.slot.lock().await;
        (
            slot.options.answer_format.clone(),
            slot.options.response_language.clone(),
        )
    }

    pub async fn select_answer_format(&self, format: &str) -> Result<(), OptionsError> {
        let mut slot = self.slot.lock().await;
        if !slot.options.answer_formats.iter().any(|f| f == format) {
            return Err(OptionsError::UnknownFormat(format.to_string()));
        }
        slot.options.answer_format = format.to_string();
        Ok(())
    }

    pub async fn select_response_language(&self, language: &str) -> Result<(), OptionsError> {
        let mut slot = self.slot.lock().await;
        if !slot.options.languages.iter().any(|l| l == language) {
            return Err(OptionsError::UnknownLanguage(language.to_string()));
        }
        slot.options.response_language = language.to_string();
        Ok(())
    }
}
