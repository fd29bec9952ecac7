use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::judicial::model::{JudicialProcess, ProcessMovement, SourceId};

/// Default bounded timeout for any single source call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Capability implemented once per external judicial record system.
///
/// `query_movements` returns an empty vec when the source holds no docket
/// entries; `SourceError::NotFound` from `query_process` is a valid outcome,
/// not an engine failure.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn source_id(&self) -> SourceId;

    async fn query_process(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Result<JudicialProcess, SourceError>;

    async fn query_movements(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Result<Vec<ProcessMovement>, SourceError>;
}

/// One entry in the bundled regional endpoint table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TribunalEndpoint {
    pub code: String,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
struct TribunalTable {
    tribunals: Vec<TribunalEndpoint>,
}

static TRIBUNALS: LazyLock<Result<Vec<TribunalEndpoint>, String>> =
    LazyLock::new(|| parse_tribunals(include_str!("tribunals.toml")));

fn parse_tribunals(raw: &str) -> Result<Vec<TribunalEndpoint>, String> {
    let parsed: TribunalTable =
        toml::from_str(raw).map_err(|e| format!("invalid tribunal table TOML: {e}"))?;
    Ok(parsed.tribunals)
}

pub fn all_tribunal_endpoints() -> Result<&'static [TribunalEndpoint], SourceError> {
    match &*TRIBUNALS {
        Ok(entries) => Ok(entries.as_slice()),
        Err(err) => Err(SourceError::Configuration(err.clone())),
    }
}

/// Resolve a two-letter region code to its base URL. Inactive regions are a
/// configuration error and must not be queried.
pub fn tribunal_base_url(region: &str) -> Result<String, SourceError> {
    let code = region.trim().to_ascii_uppercase();
    let entry = all_tribunal_endpoints()?
        .iter()
        .find(|t| t.code == code)
        .ok_or_else(|| SourceError::Configuration(format!("unknown region code '{code}'")))?;
    if !entry.active {
        return Err(SourceError::Configuration(format!(
            "region '{code}' is not active for querying"
        )));
    }
    Ok(entry.url.clone())
}

#[cfg(test)]
mod tests {
    use super::{all_tribunal_endpoints, tribunal_base_url};
    use crate::error::SourceError;

    #[test]
    fn bundled_table_parses_and_covers_known_regions() {
        let entries = all_tribunal_endpoints().expect("table should parse");
        assert!(entries.iter().any(|t| t.code == "SP" && t.active));
        assert!(entries.iter().any(|t| t.code == "PR" && !t.active));
    }

    #[test]
    fn inactive_region_is_a_configuration_error() {
        match tribunal_base_url("PR") {
            Err(SourceError::Configuration(msg)) => assert!(msg.contains("PR")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_region_is_a_configuration_error() {
        assert!(matches!(
            tribunal_base_url("ZZ"),
            Err(SourceError::Configuration(_))
        ));
    }

    #[test]
    fn region_lookup_is_case_insensitive() {
        let url = tribunal_base_url("sp").expect("SP should resolve");
        assert!(url.contains("tjsp"));
    }
}
