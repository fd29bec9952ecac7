//! Tamper-evident audit records for sync and query operations.
//!
//! Entries are appended as JSONL. Each entry carries a SHA-256 hash over its
//! own content and the hash of the previous entry, so any rewrite of history
//! breaks the chain.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of arbitrary content, e.g. downloaded document bytes.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub ts: String,
    pub operation: String,
    pub actor_id: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl AuditEntry {
    /// Build a well-formed entry: the hash covers the timestamp, operation,
    /// actor, details, and chain predecessor.
    pub fn new(
        operation: &str,
        actor_id: &str,
        details: serde_json::Value,
        prev_hash: Option<String>,
    ) -> Result<Self, serde_json::Error> {
        let mut entry = Self {
            ts: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            actor_id: actor_id.to_string(),
            details,
            prev_hash,
            hash: None,
        };
        // Hash over the Value form so key order is canonical and a verifier
        // can recompute it from the written JSON.
        let canonical = serde_json::to_string(&serde_json::to_value(&entry)?)?;
        entry.hash = Some(content_hash(canonical.as_bytes()));
        Ok(entry)
    }
}

/// Append-only audit sink. Owned by whoever orchestrates syncs; all failures
/// degrade to warnings so auditing can never fail the audited operation.
pub struct AuditLog {
    path: PathBuf,
    last_hash: Mutex<Option<String>>,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_hash: Mutex::new(None),
        }
    }

    /// Append one entry. Best effort: on any failure the entry is dropped
    /// with a warning.
    pub fn record(&self, operation: &str, actor_id: &str, details: serde_json::Value) {
        let mut last_hash = match self.last_hash.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!("audit hash-chain lock poisoned: {e}");
                return;
            }
        };

        let entry = match AuditEntry::new(operation, actor_id, details, last_hash.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("failed to build audit entry: {e}");
                return;
            }
        };

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("failed to serialize audit entry: {e}");
                return;
            }
        };

        if self.append_line(&line) {
            *last_hash = entry.hash;
        }
    }

    fn append_line(&self, line: &str) -> bool {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create audit log dir {:?}: {e}", parent);
                return false;
            }
        }

        // Entries may reference case identifiers; keep the file owner-only
        // and refuse pre-existing files with looser permissions.
        let mut open_opts = OpenOptions::new();
        open_opts.create(true).append(true);
        #[cfg(unix)]
        open_opts.mode(0o600);

        match open_opts.open(&self.path) {
            Ok(mut file) => {
                #[cfg(unix)]
                {
                    let mode = match file.metadata() {
                        Ok(meta) => meta.permissions().mode() & 0o777,
                        Err(e) => {
                            tracing::warn!("failed to stat audit log {:?}: {e}", self.path);
                            return false;
                        }
                    };
                    if mode != 0o600 {
                        tracing::warn!(
                            "refusing to append audit entry; insecure mode {mode:o} on {:?}",
                            self.path
                        );
                        return false;
                    }
                }
                match writeln!(file, "{line}") {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("failed to append audit entry: {e}");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::warn!("failed to open audit log {:?}: {e}", self.path);
                false
            }
        }
    }
}
