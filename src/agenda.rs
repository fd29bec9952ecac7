//! Docket-wide scheduling conflict detection.
//!
//! Pure and synchronous: events in, conflicts out, no hidden state. Events
//! may come from synced hearings and deadlines or manual entries; the
//! detector only sees the `ScheduledEvent` shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Events with no explicit duration occupy this nominal window. It applies
/// to deadlines too, so two deadlines at the same instant collide.
pub const DEFAULT_EVENT_DURATION_MINUTES: u32 = 60;

const SUGGESTED_RESCHEDULE_HOUR: u32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Hearing,
    Deadline,
    Meeting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: String,
    pub kind: EventKind,
    pub title: String,
    pub case_title: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: Option<u32>,
}

impl ScheduledEvent {
    fn interval_end(&self) -> DateTime<Utc> {
        let minutes = self
            .duration_minutes
            .unwrap_or(DEFAULT_EVENT_DURATION_MINUTES);
        self.starts_at + Duration::minutes(i64::from(minutes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub other_title: String,
    pub other_case: String,
    pub severity: Severity,
}

/// All overlaps found for one anchor event, with a fixed reschedule
/// suggestion of 09:00 the following calendar day. The suggestion does not
/// check whether that slot is itself free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub event_id: String,
    pub kind: EventKind,
    pub starts_at: DateTime<Utc>,
    pub entries: Vec<ConflictEntry>,
    pub suggested_reschedule: Option<DateTime<Utc>>,
}

fn severity_for(a: EventKind, b: EventKind) -> Severity {
    if a == EventKind::Hearing && b == EventKind::Hearing {
        Severity::High
    } else if a == EventKind::Deadline || b == EventKind::Deadline {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn suggested_reschedule(anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (anchor + Duration::days(1))
        .date_naive()
        .and_hms_opt(SUGGESTED_RESCHEDULE_HOUR, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Pairwise interval-overlap detection across a user's docket.
///
/// Events are compared in ascending instant order; two events conflict when
/// they fall on the same calendar day and the later one starts before the
/// earlier one's occupied interval ends. O(n²), which is fine at docket
/// scale, and deterministic for identical input.
pub fn detect_conflicts(events: &[ScheduledEvent]) -> Vec<Conflict> {
    let mut ordered: Vec<&ScheduledEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.starts_at);

    let mut conflicts = Vec::new();

    for (i, anchor) in ordered.iter().enumerate() {
        let anchor_end = anchor.interval_end();
        let mut entries = Vec::new();

        for other in ordered.iter().skip(i + 1) {
            let same_day = anchor.starts_at.date_naive() == other.starts_at.date_naive();
            if same_day && other.starts_at < anchor_end {
                entries.push(ConflictEntry {
                    other_title: other.title.clone(),
                    other_case: other.case_title.clone(),
                    severity: severity_for(anchor.kind, other.kind),
                });
            }
        }

        if !entries.is_empty() {
            conflicts.push(Conflict {
                event_id: anchor.id.clone(),
                kind: anchor.kind,
                starts_at: anchor.starts_at,
                entries,
                suggested_reschedule: suggested_reschedule(anchor.starts_at),
            });
        }
    }

    conflicts
}
