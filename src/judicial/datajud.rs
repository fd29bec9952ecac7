//! CNJ Datajud integration: national public API behind an OAuth2
//! client-credentials exchange with a cached access token.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::SourceError;
use crate::judicial::model::{
    Counsel, JudicialProcess, Party, PartyRole, ProcessMovement, SourceId,
};
use crate::judicial::source::SourceClient;

pub const DATAJUD_BASE_URL: &str = "https://datajud-wiki.cnj.jus.br/api-publica";
pub const DATAJUD_TOKEN_URL: &str = "https://datajud.cnj.jus.br/oauth/token";
const DATAJUD_SCOPE: &str = "datajud:read";

/// Cached bearer token. Owned exclusively by one client instance and replaced
/// wholesale on refresh, never mutated in place.
#[derive(Debug, Clone)]
struct AuthToken {
    bearer: String,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

pub struct DatajudClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    // Serializes the check-then-refresh sequence across concurrent callers.
    token: Mutex<Option<AuthToken>>,
}

impl DatajudClient {
    pub fn new(
        client_id: String,
        client_secret: SecretString,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Self::with_endpoints(
            client_id,
            client_secret,
            DATAJUD_BASE_URL.to_string(),
            DATAJUD_TOKEN_URL.to_string(),
            timeout,
        )
    }

    pub fn with_endpoints(
        client_id: String,
        client_secret: SecretString,
        base_url: String,
        token_url: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_url,
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, performing at most one client-credentials
    /// exchange when the cached token is missing or expired.
    async fn ensure_token(&self) -> Result<String, SourceError> {
        let mut cache = self.token.lock().await;
        if let Some(token) = cache.as_ref() {
            if token.is_valid(Utc::now()) {
                return Ok(token.bearer.clone());
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("scope", DATAJUD_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| SourceError::Transient(format!("token exchange failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SourceError::Transient(format!(
                "token exchange returned status {}",
                response.status()
            )));
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| SourceError::Transient(format!("malformed token response: {e}")))?;

        let token = AuthToken {
            bearer: grant.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(grant.expires_in),
        };
        let bearer = token.bearer.clone();
        *cache = Some(token);
        tracing::debug!(source = "datajud", "access token refreshed");
        Ok(bearer)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SourceError> {
        let bearer = self.ensure_token().await?;
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::NotFound),
            StatusCode::UNAUTHORIZED => Err(SourceError::Transient(
                "Datajud rejected the access token (401)".to_string(),
            )),
            status if !status.is_success() => Err(SourceError::Transient(format!(
                "Datajud returned unexpected status {status}"
            ))),
            _ => Ok(response),
        }
    }

    #[cfg(test)]
    pub(crate) async fn seed_token_for_tests(&self, bearer: &str, expires_at: DateTime<Utc>) {
        *self.token.lock().await = Some(AuthToken {
            bearer: bearer.to_string(),
            expires_at,
        });
    }
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: i64,
}

#[async_trait]
impl SourceClient for DatajudClient {
    fn source_id(&self) -> SourceId {
        SourceId::Datajud
    }

    async fn query_process(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Result<JudicialProcess, SourceError> {
        let raw: RawProcess = self
            .get(&format!("/processo/{tribunal}/{process_number}"))
            .await?
            .json()
            .await?;
        tracing::debug!(process_number, source = "datajud", "process snapshot fetched");
        Ok(normalize_process(raw))
    }

    async fn query_movements(
        &self,
        process_number: &str,
        tribunal: &str,
    ) -> Result<Vec<ProcessMovement>, SourceError> {
        let raw: RawMovementsResponse = match self
            .get(&format!("/processo/{tribunal}/{process_number}/movimentacoes"))
            .await
        {
            Ok(response) => response.json().await?,
            Err(SourceError::NotFound) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        tracing::debug!(
            process_number,
            source = "datajud",
            count = raw.movimentacoes.len(),
            "movements fetched"
        );
        Ok(raw.movimentacoes.into_iter().map(normalize_movement).collect())
    }
}

// Raw wire shapes, following the Datajud public API field names.

#[derive(Debug, Deserialize)]
pub(crate) struct RawProcess {
    #[serde(rename = "numeroProcesso")]
    pub numero_processo: String,
    pub tribunal: String,
    #[serde(default)]
    pub assuntos: Vec<RawSubject>,
    #[serde(rename = "dataAjuizamento")]
    pub data_ajuizamento: DateTime<Utc>,
    pub situacao: Option<String>,
    pub fase: Option<String>,
    #[serde(rename = "orgaoJulgador")]
    pub orgao_julgador: Option<RawAdjudicatingBody>,
    #[serde(default)]
    pub partes: Vec<RawParty>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSubject {
    pub descricao: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAdjudicatingBody {
    #[serde(rename = "nomeJuiz")]
    pub nome_juiz: Option<String>,
    #[serde(rename = "nomeOrgao")]
    pub nome_orgao: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawParty {
    pub nome: String,
    pub polo: String,
    #[serde(default)]
    pub advogados: Vec<RawCounsel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCounsel {
    pub nome: String,
    #[serde(rename = "numeroOAB")]
    pub numero_oab: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawMovementsResponse {
    #[serde(default)]
    pub movimentacoes: Vec<RawMovement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMovement {
    pub codigo: Option<String>,
    #[serde(rename = "dataHora")]
    pub data_hora: DateTime<Utc>,
    pub nome: String,
    pub complemento: Option<String>,
}

pub(crate) fn normalize_process(raw: RawProcess) -> JudicialProcess {
    let (judge, venue) = raw
        .orgao_julgador
        .map(|o| (o.nome_juiz, o.nome_orgao))
        .unwrap_or((None, None));

    JudicialProcess {
        process_number: raw.numero_processo,
        tribunal: raw.tribunal,
        subject: raw
            .assuntos
            .into_iter()
            .next()
            .map(|s| s.descricao)
            .unwrap_or_else(|| "unspecified".to_string()),
        filed_at: raw.data_ajuizamento,
        status: raw.situacao.unwrap_or_else(|| "in progress".to_string()),
        phase: raw.fase.unwrap_or_else(|| "unspecified".to_string()),
        judge,
        venue,
        parties: raw.partes.into_iter().map(normalize_party).collect(),
        claim_value: None,
    }
}

fn normalize_party(raw: RawParty) -> Party {
    // Datajud only distinguishes active ("AT") and passive poles.
    let role = if raw.polo == "AT" {
        PartyRole::Claimant
    } else {
        PartyRole::Respondent
    };
    Party {
        name: raw.nome,
        role,
        document_id: None,
        counsel: raw.advogados.into_iter().next().map(|a| Counsel {
            name: a.nome,
            bar_registration: a.numero_oab,
        }),
    }
}

pub(crate) fn normalize_movement(raw: RawMovement) -> ProcessMovement {
    ProcessMovement {
        // Movements without a code get a deterministic id from their instant.
        id: raw
            .codigo
            .unwrap_or_else(|| raw.data_hora.timestamp_millis().to_string()),
        occurred_at: raw.data_hora,
        category: raw.nome.clone(),
        description: raw.complemento.unwrap_or(raw.nome),
        judge: None,
        published_at: None,
        deadline: None,
        documents: Vec::new(),
    }
}
