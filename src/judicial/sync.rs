//! Concurrent multi-source sync with per-source failure isolation.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::error::SourceError;
use crate::judicial::model::{JudicialProcess, SourceId, SyncResult};
use crate::judicial::source::{SourceClient, TribunalEndpoint, all_tribunal_endpoints};

/// Invokes every configured source for a case and reports one result per
/// source, regardless of individual outcomes.
pub struct SyncOrchestrator {
    sources: Vec<Arc<dyn SourceClient>>,
    audit: Option<Arc<AuditLog>>,
    actor_id: String,
}

impl SyncOrchestrator {
    pub fn new(sources: Vec<Arc<dyn SourceClient>>) -> Self {
        Self {
            sources,
            audit: None,
            actor_id: "system".to_string(),
        }
    }

    pub fn with_audit(mut self, audit: Arc<AuditLog>, actor_id: impl Into<String>) -> Self {
        self.audit = Some(audit);
        self.actor_id = actor_id.into();
        self
    }

    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|s| s.source_id()).collect()
    }

    /// Query every configured source's movements concurrently and convert
    /// each outcome into exactly one `SyncResult`, in declaration order.
    ///
    /// No source call blocks another; total latency is bounded by the slowest
    /// source. Failures never abort the operation, and a fully failed sync is
    /// still a complete result list.
    pub async fn sync_case(&self, process_number: &str, tribunal: &str) -> Vec<SyncResult> {
        let calls = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            async move {
                let id = source.source_id();
                match source.query_movements(process_number, tribunal).await {
                    Ok(movements) => SyncResult::succeeded(id, &movements),
                    Err(SourceError::NotFound) => SyncResult::succeeded(id, &[]),
                    Err(err) => {
                        tracing::warn!(
                            process_number,
                            source = %id,
                            error = %err,
                            "source sync failed"
                        );
                        SyncResult::failed(id, err.to_string())
                    }
                }
            }
        });

        let results = futures::future::join_all(calls).await;

        self.record_audit(process_number, &results);
        results
    }

    /// Fetch the current process snapshot from every source concurrently.
    ///
    /// Results are never merged across sources; each entry stands on its own
    /// and reconciliation is the caller's decision.
    pub async fn fetch_snapshots(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Vec<(SourceId, Result<JudicialProcess, SourceError>)> {
        let calls = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            async move {
                let id = source.source_id();
                (id, source.query_process(process_number, tribunal).await)
            }
        });
        futures::future::join_all(calls).await
    }

    /// The bundled regional endpoint table, for callers that present source
    /// coverage to users.
    pub fn list_supported_sources() -> Result<&'static [TribunalEndpoint], SourceError> {
        all_tribunal_endpoints()
    }

    // Best effort: an unavailable audit sink must never fail the sync.
    fn record_audit(&self, process_number: &str, results: &[SyncResult]) {
        let Some(audit) = &self.audit else {
            return;
        };
        let per_source: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|r| (r.source.as_str().to_string(), serde_json::Value::Bool(r.success)))
            .collect();
        audit.record(
            "judicial_sync",
            &self.actor_id,
            serde_json::json!({
                "process_number": process_number,
                "sources": per_source,
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::SyncOrchestrator;
    use crate::error::SourceError;
    use crate::judicial::model::{JudicialProcess, ProcessMovement, SourceId};
    use crate::judicial::source::SourceClient;

    struct ScriptedSource {
        id: SourceId,
        movements: Result<usize, String>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn succeeding(id: SourceId, movement_count: usize) -> Self {
            Self {
                id,
                movements: Ok(movement_count),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(id: SourceId, error: &str) -> Self {
            Self {
                id,
                movements: Err(error.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn movement(n: usize) -> ProcessMovement {
            ProcessMovement {
                id: format!("m-{n}"),
                occurred_at: Utc::now(),
                category: if n == 0 {
                    "Decis\u{e3}o".to_string()
                } else {
                    "Juntada".to_string()
                },
                description: "scripted".to_string(),
                judge: None,
                published_at: None,
                deadline: None,
                documents: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl SourceClient for ScriptedSource {
        fn source_id(&self) -> SourceId {
            self.id
        }

        async fn query_process(
            &self,
            _process_number: &str,
            _tribunal: &str,
        ) -> Result<JudicialProcess, SourceError> {
            Err(SourceError::NotFound)
        }

        async fn query_movements(
            &self,
            _process_number: &str,
            _tribunal: &str,
        ) -> Result<Vec<ProcessMovement>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.movements {
                Ok(count) => Ok((0..*count).map(Self::movement).collect()),
                Err(msg) => Err(SourceError::Transient(msg.clone())),
            }
        }
    }

    #[tokio::test]
    async fn partial_failure_yields_one_result_per_source() {
        let ok = Arc::new(ScriptedSource::succeeding(SourceId::Esaj, 3));
        let bad = Arc::new(ScriptedSource::failing(SourceId::Datajud, "boom"));
        let orchestrator =
            SyncOrchestrator::new(vec![ok.clone(), bad.clone()]);

        let results = orchestrator.sync_case("0001", "SP").await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, SourceId::Esaj);
        assert!(results[0].success);
        assert_eq!(results[0].new_movements, 3);
        assert_eq!(results[0].new_decisions, 1);
        assert!(results[0].error.is_none());

        assert_eq!(results[1].source, SourceId::Datajud);
        assert!(!results[1].success);
        assert_eq!(results[1].new_movements, 0);
        assert!(results[1].error.as_deref().unwrap_or("").contains("boom"));

        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
        assert_eq!(bad.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn results_follow_source_declaration_order() {
        let orchestrator = SyncOrchestrator::new(vec![
            Arc::new(ScriptedSource::failing(SourceId::Datajud, "x")),
            Arc::new(ScriptedSource::succeeding(SourceId::Esaj, 0)),
        ]);

        let results = orchestrator.sync_case("0002", "SP").await;
        let order: Vec<SourceId> = results.iter().map(|r| r.source).collect();
        assert_eq!(order, vec![SourceId::Datajud, SourceId::Esaj]);
    }

    #[tokio::test]
    async fn not_found_counts_as_an_empty_success() {
        struct NotFoundSource;

        #[async_trait]
        impl SourceClient for NotFoundSource {
            fn source_id(&self) -> SourceId {
                SourceId::Esaj
            }
            async fn query_process(
                &self,
                _p: &str,
                _t: &str,
            ) -> Result<JudicialProcess, SourceError> {
                Err(SourceError::NotFound)
            }
            async fn query_movements(
                &self,
                _p: &str,
                _t: &str,
            ) -> Result<Vec<ProcessMovement>, SourceError> {
                Err(SourceError::NotFound)
            }
        }

        let orchestrator = SyncOrchestrator::new(vec![Arc::new(NotFoundSource)]);
        let results = orchestrator.sync_case("0003", "SP").await;
        assert!(results[0].success);
        assert_eq!(results[0].new_movements, 0);
    }

    #[tokio::test]
    async fn snapshots_are_reported_per_source_without_merging() {
        let orchestrator = SyncOrchestrator::new(vec![
            Arc::new(ScriptedSource::succeeding(SourceId::Esaj, 0)),
            Arc::new(ScriptedSource::succeeding(SourceId::Datajud, 0)),
        ]);

        let snapshots = orchestrator.fetch_snapshots("0004", "SP").await;
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|(_, r)| matches!(
            r,
            Err(SourceError::NotFound)
        )));
    }
}
