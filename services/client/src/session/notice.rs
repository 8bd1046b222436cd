//! services/client/src/session/notice.rs
//!
//! Transient user-facing notices ("toasts") that dismiss themselves.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// How long a notice stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: Uuid,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    expires_at: Instant,
}

/// A single notice slot; a new notice replaces the current one.
pub struct Notices {
    slot: Mutex<Option<Notice>>,
    ttl: Duration,
}

impl Default for Notices {
    fn default() -> Self {
        Self::with_duration(NOTICE_DURATION)
    }
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duration(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn post(&self, message: impl Into<String>) -> Uuid {
        let notice = Notice {
            id: Uuid::new_v4(),
            message: message.into(),
            raised_at: Utc::now(),
            expires_at: Instant::now() + self.ttl,
        };
        let id = notice.id;
        *self.slot.lock() = Some(notice);
        id
    }

    /// The visible notice, dropping it once it has expired.
    pub fn current(&self) -> Option<Notice> {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|n| Instant::now() >= n.expires_at) {
            *slot = None;
        }
        slot.clone()
    }

    pub fn dismiss(&self, id: Uuid) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|n| n.id == id) {
            *slot = None;
        }
    }
}
