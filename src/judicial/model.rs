use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical snapshot of one external case record.
///
/// The process number is the stable external identifier and is never rewritten
/// after fetch. Snapshots from different sources for the same number are kept
/// as distinct values; reconciliation is a caller decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudicialProcess {
    pub process_number: String,
    pub tribunal: String,
    pub subject: String,
    pub filed_at: DateTime<Utc>,
    pub status: String,
    pub phase: String,
    pub judge: Option<String>,
    pub venue: Option<String>,
    pub parties: Vec<Party>,
    pub claim_value: Option<ClaimValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub role: PartyRole,
    pub document_id: Option<String>,
    pub counsel: Option<Counsel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    Claimant,
    Respondent,
    ThirdParty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counsel {
    pub name: String,
    pub bar_registration: String,
}

/// Monetary claim attached to a process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimValue {
    pub nominal: Decimal,
    pub adjusted: Decimal,
    pub correction_index: String,
}

/// One docket entry in a process's history. Movements are read-only facts
/// produced by a source at query time; they are appended, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMovement {
    pub id: String,
    pub occurred_at: DateTime<Utc>,
    pub category: String,
    pub description: String,
    pub judge: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub deadline: Option<Deadline>,
    pub documents: Vec<ProcessDocument>,
}

/// How close to due a deadline must be before it is flagged critical.
pub const CRITICAL_DEADLINE_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    pub day_count: i64,
    pub due_at: DateTime<Utc>,
    pub recourse_type: String,
    /// Recomputed at normalization time, never trusted from the source.
    pub critical: bool,
}

impl Deadline {
    /// Whole days remaining until `due_at`; critical when ≤ 5.
    pub fn is_critical(due_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (due_at - now).num_days() <= CRITICAL_DEADLINE_DAYS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDocument {
    pub id: String,
    pub name: String,
    pub category: String,
    pub size_bytes: u64,
    pub content_hash: Option<String>,
}

/// Identifies which external integration produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Esaj,
    Datajud,
    Offline,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esaj => "esaj",
            Self::Datajud => "datajud",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one source's attempt to sync one process. Exactly one per
/// (process, source) per sync invocation; immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResult {
    pub success: bool,
    pub source: SourceId,
    pub timestamp: DateTime<Utc>,
    pub new_movements: usize,
    pub new_decisions: usize,
    pub error: Option<String>,
}

impl SyncResult {
    pub fn succeeded(source: SourceId, movements: &[ProcessMovement]) -> Self {
        Self {
            success: true,
            source,
            timestamp: Utc::now(),
            new_movements: movements.len(),
            new_decisions: movements.iter().filter(|m| is_decision(&m.category)).count(),
            error: None,
        }
    }

    pub fn failed(source: SourceId, error: String) -> Self {
        Self {
            success: false,
            source,
            timestamp: Utc::now(),
            new_movements: 0,
            new_decisions: 0,
            error: Some(error),
        }
    }
}

// Datajud and e-SAJ label decisions in Portuguese; keep the English spelling
// for sources that localize.
fn is_decision(category: &str) -> bool {
    let lower = category.to_lowercase();
    lower.contains("decis\u{e3}o") || lower.contains("decision")
}
