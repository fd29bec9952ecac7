//! Jurisync: judicial process synchronization engine.
//!
//! Polls independent judicial record sources (e-SAJ bearer-token regionals,
//! CNJ Datajud OAuth2) for tracked cases, normalizes their responses into one
//! canonical process/movement model, runs per-case periodic sync schedules,
//! detects docket scheduling conflicts, and emits tamper-evident audit
//! records. Web transport, storage, and generated content are the embedding
//! application's concern.

pub mod agenda;
pub mod audit;
pub mod config;
pub mod error;
pub mod judicial;
pub mod redaction;

pub use agenda::{
    Conflict, ConflictEntry, EventKind, ScheduledEvent, Severity, detect_conflicts,
};
pub use audit::{AuditEntry, AuditLog, content_hash};
pub use config::{SourceMode, SyncConfig};
pub use error::{ConfigError, SourceError};
pub use judicial::{
    DatajudClient, EsajClient, JudicialProcess, OfflineClient, ProcessMovement, SourceClient,
    SourceId, SyncOrchestrator, SyncResult, SyncScheduler,
};
