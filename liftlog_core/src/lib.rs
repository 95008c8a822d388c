#![forbid(unsafe_code)]

//! Core domain model and business logic for logging strength training sessions.
//!
//! This crate provides:
//! - Domain types (programs, days, blocks, performed sets, history)
//! - Program tree editing and normalization
//! - Session pre-fill and set/drop-set edits
//! - Session editor with auto-save identity reconciliation
//! - Persistence (REST backend, crash-recovery drafts, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod program;
pub mod prefill;
pub mod sets;
pub mod summary;
pub mod reconcile;
pub mod backend;
pub mod draft;
pub mod editor;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use backend::{HttpBackend, InMemoryBackend, LogSessionPayload, SessionBackend};
pub use draft::{DraftStore, SessionDraft};
pub use editor::{AutoSaveOutcome, EditorMode, SessionEditor};
pub use prefill::{prefill_for_day, PrefillDefaults};
pub use summary::{ProgramProgressSummary, SessionProgress};
pub use export::export_day_logs;
