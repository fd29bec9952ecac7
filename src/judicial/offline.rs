//! Offline source variant for development and demos.
//!
//! Selected only by explicit configuration (`SourceMode::Offline`); the real
//! clients never fabricate data when credentials are missing.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::error::SourceError;
use crate::judicial::model::{
    Deadline, JudicialProcess, Party, PartyRole, ProcessMovement, SourceId,
};
use crate::judicial::source::SourceClient;

#[derive(Debug, Default)]
pub struct OfflineClient;

impl OfflineClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceClient for OfflineClient {
    fn source_id(&self) -> SourceId {
        SourceId::Offline
    }

    async fn query_process(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Result<JudicialProcess, SourceError> {
        Ok(JudicialProcess {
            process_number: process_number.to_string(),
            tribunal: tribunal.to_string(),
            subject: "Offline sample case".to_string(),
            filed_at: Utc::now() - Duration::days(90),
            status: "in progress".to_string(),
            phase: "instruction".to_string(),
            judge: None,
            venue: None,
            parties: vec![Party {
                name: "Sample Claimant".to_string(),
                role: PartyRole::Claimant,
                document_id: None,
                counsel: None,
            }],
            claim_value: None,
        })
    }

    async fn query_movements(
        &self,
        process_number: &str,
        _tribunal: &str,
    ) -> Result<Vec<ProcessMovement>, SourceError> {
        let now = Utc::now();
        let due_at = now + Duration::days(10);
        Ok(vec![ProcessMovement {
            id: format!("{process_number}-offline-1"),
            occurred_at: now - Duration::days(1),
            category: "Intima\u{e7}\u{e3}o".to_string(),
            description: "Offline sample movement".to_string(),
            judge: None,
            published_at: None,
            deadline: Some(Deadline {
                day_count: 10,
                due_at,
                recourse_type: "manifesta\u{e7}\u{e3}o".to_string(),
                critical: Deadline::is_critical(due_at, now),
            }),
            documents: Vec::new(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::OfflineClient;
    use crate::judicial::source::SourceClient;

    #[tokio::test]
    async fn offline_client_always_answers() {
        let client = OfflineClient::new();
        let process = client.query_process("0001", "SP").await.expect("process");
        assert_eq!(process.process_number, "0001");

        let movements = client.query_movements("0001", "SP").await.expect("movements");
        assert_eq!(movements.len(), 1);
        assert!(movements[0].deadline.is_some());
    }
}
