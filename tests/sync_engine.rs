//! End-to-end engine tests over mock HTTP sources.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jurisync::audit::AuditLog;
use jurisync::judicial::datajud::DatajudClient;
use jurisync::judicial::esaj::EsajClient;
use jurisync::judicial::model::SourceId;
use jurisync::judicial::source::SourceClient;
use jurisync::judicial::sync::SyncOrchestrator;

const PROCESS: &str = "1002345-67.2024.8.26.0100";

fn esaj_client(server: &MockServer) -> EsajClient {
    EsajClient::with_base_url(
        SecretString::from("test-bearer"),
        server.uri(),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

fn datajud_client(server: &MockServer) -> DatajudClient {
    DatajudClient::with_endpoints(
        "client-id".to_string(),
        SecretString::from("client-secret"),
        server.uri(),
        format!("{}/oauth/token", server.uri()),
        Duration::from_secs(5),
    )
    .expect("client should build")
}

fn movements_body() -> serde_json::Value {
    serde_json::json!({
        "movimentacoes": [
            {
                "id": "mov-1",
                "data": "2025-01-09T14:00:00Z",
                "tipo": "Decis\u{e3}o Interlocut\u{f3}ria",
                "descricao": "Defiro a tutela de urg\u{ea}ncia"
            },
            {
                "id": "mov-2",
                "data": "2025-01-10T09:00:00Z",
                "tipo": "Juntada de Peti\u{e7}\u{e3}o",
                "descricao": "Contesta\u{e7}\u{e3}o apresentada"
            }
        ]
    })
}

#[tokio::test]
async fn esaj_movements_are_fetched_with_the_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/processo/{PROCESS}/movimentacoes")))
        .and(header("authorization", "Bearer test-bearer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movements_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = esaj_client(&server);
    let movements = client.query_movements(PROCESS, "SP").await.expect("movements");

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].id, "mov-1");
    assert_eq!(movements[0].category, "Decis\u{e3}o Interlocut\u{f3}ria");
}

#[tokio::test]
async fn esaj_unauthorized_is_a_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = esaj_client(&server);
    let err = client
        .query_movements(PROCESS, "SP")
        .await
        .expect_err("401 should fail");
    assert!(matches!(err, jurisync::SourceError::Transient(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn esaj_missing_process_yields_an_empty_docket() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = esaj_client(&server);
    let movements = client.query_movements(PROCESS, "SP").await.expect("empty");
    assert!(movements.is_empty());
}

#[tokio::test]
async fn esaj_slow_source_times_out_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(movements_body())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let client = EsajClient::with_base_url(
        SecretString::from("test-bearer"),
        server.uri(),
        Duration::from_millis(200),
    )
    .expect("client should build");

    let err = client
        .query_movements(PROCESS, "SP")
        .await
        .expect_err("timeout should fail");
    assert!(matches!(err, jurisync::SourceError::Transient(_)));
}

#[tokio::test]
async fn datajud_refreshes_once_then_reuses_the_cached_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/processo/TJSP/{PROCESS}/movimentacoes")))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "movimentacoes": [
                { "codigo": "77", "dataHora": "2025-01-08T11:00:00Z", "nome": "Conclus\u{e3}o" }
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = datajud_client(&server);

    // Empty cache: exactly one token exchange before the data call.
    let first = client.query_movements(PROCESS, "TJSP").await.expect("first sync");
    assert_eq!(first.len(), 1);

    // Within the validity window: zero further exchanges.
    let second = client.query_movements(PROCESS, "TJSP").await.expect("second sync");
    assert_eq!(second.len(), 1);

    let token_calls = server
        .received_requests()
        .await
        .expect("requests recorded")
        .iter()
        .filter(|r| r.url.path() == "/oauth/token")
        .count();
    assert_eq!(token_calls, 1);
}

#[tokio::test]
async fn datajud_failed_exchange_is_transient_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = datajud_client(&server);
    let err = client
        .query_movements(PROCESS, "TJSP")
        .await
        .expect_err("exchange failure should surface");
    assert!(matches!(err, jurisync::SourceError::Transient(_)));
}

#[tokio::test]
async fn sync_case_isolates_failures_and_audits_the_outcome() {
    let esaj_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/processo/{PROCESS}/movimentacoes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(movements_body()))
        .mount(&esaj_server)
        .await;

    // Datajud's auth host is down; its failure must not touch the e-SAJ result.
    let datajud = DatajudClient::with_endpoints(
        "client-id".to_string(),
        SecretString::from("client-secret"),
        "http://127.0.0.1:9".to_string(),
        "http://127.0.0.1:9/oauth/token".to_string(),
        Duration::from_secs(2),
    )
    .expect("client should build");

    let audit_dir = tempfile::tempdir().expect("tempdir");
    let audit_path = audit_dir.path().join("audit.jsonl");
    let audit = Arc::new(AuditLog::new(audit_path.clone()));

    let orchestrator = SyncOrchestrator::new(vec![
        Arc::new(esaj_client(&esaj_server)),
        Arc::new(datajud),
    ])
    .with_audit(Arc::clone(&audit), "adv-123");

    let results = orchestrator.sync_case(PROCESS, "TJSP").await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source, SourceId::Esaj);
    assert!(results[0].success);
    assert_eq!(results[0].new_movements, 2);
    assert_eq!(results[0].new_decisions, 1);
    assert_eq!(results[1].source, SourceId::Datajud);
    assert!(!results[1].success);
    assert!(results[1].error.is_some());

    let raw = std::fs::read_to_string(&audit_path).expect("audit written");
    let entry: serde_json::Value =
        serde_json::from_str(raw.lines().next().expect("one entry")).expect("entry json");
    assert_eq!(entry["operation"], "judicial_sync");
    assert_eq!(entry["actor_id"], "adv-123");
    assert_eq!(entry["details"]["process_number"], PROCESS);
    assert_eq!(entry["details"]["sources"]["esaj"], true);
    assert_eq!(entry["details"]["sources"]["datajud"], false);
    assert!(entry["hash"].is_string());
}

#[tokio::test]
async fn process_snapshots_come_back_per_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/processo/{PROCESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "numero": PROCESS,
            "tribunal": "TJ-SP",
            "assunto": "Cobran\u{e7}a",
            "dataAjuizamento": "2024-03-11T00:00:00Z",
            "status": "Em andamento",
            "fase": "Inicial"
        })))
        .mount(&server)
        .await;

    let orchestrator = SyncOrchestrator::new(vec![Arc::new(esaj_client(&server))]);
    let snapshots = orchestrator.fetch_snapshots(PROCESS, "SP").await;

    assert_eq!(snapshots.len(), 1);
    let (source, result) = &snapshots[0];
    assert_eq!(*source, SourceId::Esaj);
    let process = result.as_ref().expect("snapshot");
    assert_eq!(process.process_number, PROCESS);
    assert_eq!(process.subject, "Cobran\u{e7}a");
}

#[tokio::test]
async fn document_download_returns_raw_bytes_for_hashing() {
    let server = MockServer::start().await;
    let body = b"%PDF-1.4 fake document".to_vec();
    Mock::given(method("GET"))
        .and(path("/documento/doc-1/download"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let client = esaj_client(&server);
    let bytes = client.download_document("doc-1").await.expect("bytes");
    assert_eq!(bytes, body);
    assert_eq!(jurisync::content_hash(&bytes).len(), 64);
}

// Keep the timestamp check close to the sync tests: results must carry the
// invocation time, not a source-reported one.
#[tokio::test]
async fn sync_results_are_stamped_at_invocation_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(movements_body()))
        .mount(&server)
        .await;

    let before = Utc::now();
    let orchestrator = SyncOrchestrator::new(vec![Arc::new(esaj_client(&server))]);
    let results = orchestrator.sync_case(PROCESS, "SP").await;
    let after = Utc::now();

    assert!(results[0].timestamp >= before && results[0].timestamp <= after);
}
