//! services/client/src/lib.rs
//!
//! The Hermes client: a session-and-interaction controller over the PDF chat
//! backend, plus the adapters that reach the backend and durable storage.

pub mod adapters;
pub mod config;
pub mod error;
pub mod session;
