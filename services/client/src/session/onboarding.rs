//! services/client/src/session/onboarding.rs
//!
//! The first-run tutorial: a fixed, forward-only sequence of steps that never
//! comes back once it has been finished or skipped.

use hermes_core::ports::DurableStorage;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage key for the "tutorial finished" flag.
pub const TUTORIAL_DONE_KEY: &str = "hermes_tutorial_done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialStep {
    pub title: &'static str,
    pub body: &'static str,
}

pub static TUTORIAL_STEPS: [TutorialStep; 7] = [
    TutorialStep {
        title: "Welcome to Hermes!",
        body: "Hermes is your smart PDF assistant. I will guide you through the main features.",
    },
    TutorialStep {
        title: "Step 1: Upload a PDF",
        body: "Stage a PDF file with `stage <path>` and send it with `upload`. PDFs are processed securely.",
    },
    TutorialStep {
        title: "Step 2: Select a PDF",
        body: "Choose a PDF from your list with `select <n>` to start asking questions about its content.",
    },
    TutorialStep {
        title: "Step 3: Ask Questions",
        body: "Type `ask` followed by your question. Hermes will analyze your PDF and answer.",
    },
    TutorialStep {
        title: "Step 4: View Answers & History",
        body: "Answers appear right away; page through long ones with `next` and `prev`. You can also view and clear your chat history.",
    },
    TutorialStep {
        title: "Step 5: Manage PDFs",
        body: "Delete PDFs you no longer need with `delete <n>`.",
    },
    TutorialStep {
        title: "All Set!",
        body: "You are ready to use Hermes. Enjoy exploring your PDFs with AI!",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingState {
    Active(usize),
    Inactive,
}

pub struct OnboardingSequencer {
    storage: Arc<dyn DurableStorage>,
    state: OnboardingState,
}

impl OnboardingSequencer {
    /// Starts at step 0 unless this installation has already finished the tutorial.
    pub fn start(storage: Arc<dyn DurableStorage>) -> Self {
        let done = match storage.get(TUTORIAL_DONE_KEY) {
            Ok(flag) => flag.is_some(),
            Err(e) => {
                warn!("Could not read the tutorial flag: {}", e);
                false
            }
        };
        let state = if done {
            OnboardingState::Inactive
        } else {
            OnboardingState::Active(0)
        };
        Self { storage, state }
    }

    pub fn state(&self) -> OnboardingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, OnboardingState::Active(_))
    }

    pub fn current(&self) -> Option<(usize, &'static TutorialStep)> {
        match self.state {
            OnboardingState::Active(index) => TUTORIAL_STEPS.get(index).map(|step| (index, step)),
            OnboardingState::Inactive => None,
        }
    }

    /// Moves to the next step, completing the tutorial from the last one.
    pub fn advance(&mut self) -> OnboardingState {
        if let OnboardingState::Active(index) = self.state {
            if index + 1 < TUTORIAL_STEPS.len() {
                self.state = OnboardingState::Active(index + 1);
            } else {
                self.complete();
            }
        }
        self.state
    }

    /// Completes the tutorial from any step.
    pub fn skip(&mut self) -> OnboardingState {
        if self.is_active() {
            self.complete();
        }
        self.state
    }

    fn complete(&mut self) {
        self.state = OnboardingState::Inactive;
        if let Err(e) = self.storage.set(TUTORIAL_DONE_KEY, "1") {
            warn!("Could not persist the tutorial flag: {}", e);
        }
        info!("Tutorial completed");
    }
}
