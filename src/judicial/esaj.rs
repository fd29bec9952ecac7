//! e-SAJ integration: regional REST APIs authenticated with a statically
//! provisioned bearer credential.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::SourceError;
use crate::judicial::model::{
    ClaimValue, Counsel, Deadline, JudicialProcess, Party, PartyRole, ProcessDocument,
    ProcessMovement, SourceId,
};
use crate::judicial::source::{SourceClient, tribunal_base_url};

pub struct EsajClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl EsajClient {
    /// Build a client for a two-letter region code from the bundled tribunal
    /// table. Inactive regions are rejected up front.
    pub fn for_region(
        token: SecretString,
        region: &str,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let base_url = tribunal_base_url(region)?;
        Self::with_base_url(token, base_url, timeout)
    }

    pub fn with_base_url(
        token: SecretString,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, SourceError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(SourceError::NotFound),
            // The credential is provisioned externally; there is nothing to
            // renew here, so an expired token surfaces as transient until the
            // caller re-provisions it out of band.
            StatusCode::UNAUTHORIZED => Err(SourceError::Transient(
                "e-SAJ rejected the bearer credential (401); re-provision the token".to_string(),
            )),
            status if !status.is_success() => Err(SourceError::Transient(format!(
                "e-SAJ returned unexpected status {status}"
            ))),
            _ => Ok(response),
        }
    }

    /// Fetch the raw bytes of an attached document.
    pub async fn download_document(&self, document_id: &str) -> Result<Vec<u8>, SourceError> {
        let response = self.get(&format!("/documento/{document_id}/download")).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SourceClient for EsajClient {
    fn source_id(&self) -> SourceId {
        SourceId::Esaj
    }

    async fn query_process(
        &self,
        process_number: &str,
        _tribunal: &str,
    ) -> Result<JudicialProcess, SourceError> {
        let raw: RawProcess = self
            .get(&format!("/processo/{process_number}"))
            .await?
            .json()
            .await?;
        tracing::debug!(process_number, source = "esaj", "process snapshot fetched");
        Ok(normalize_process(raw))
    }

    async fn query_movements(
        &self,
        process_number: &str,
        _tribunal: &str,
    ) -> Result<Vec<ProcessMovement>, SourceError> {
        let raw: RawMovementsResponse = match self
            .get(&format!("/processo/{process_number}/movimentacoes"))
            .await
        {
            Ok(response) => response.json().await?,
            // No record at this source is an empty docket, not a failure.
            Err(SourceError::NotFound) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let now = Utc::now();
        tracing::debug!(
            process_number,
            source = "esaj",
            count = raw.movimentacoes.len(),
            "movements fetched"
        );
        Ok(raw
            .movimentacoes
            .into_iter()
            .map(|m| normalize_movement(m, now))
            .collect())
    }
}

// Raw wire shapes. Field names follow the e-SAJ payloads verbatim; unknown
// fields are ignored.

#[derive(Debug, Deserialize)]
pub(crate) struct RawProcess {
    pub numero: String,
    pub tribunal: Option<String>,
    pub assunto: String,
    #[serde(rename = "dataAjuizamento")]
    pub data_ajuizamento: DateTime<Utc>,
    pub status: String,
    pub fase: String,
    pub juiz: Option<RawJudge>,
    pub juizado: Option<String>,
    #[serde(default)]
    pub partes: Vec<RawParty>,
    pub valor: Option<RawClaimValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawJudge {
    pub nome: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawParty {
    pub nome: String,
    pub tipo: String,
    pub cpf: Option<String>,
    pub cnpj: Option<String>,
    pub advogado: Option<RawCounsel>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCounsel {
    pub nome: String,
    pub oab: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawClaimValue {
    pub inicial: Decimal,
    pub atualizado: Decimal,
    #[serde(rename = "correcaoMonetaria")]
    pub correcao_monetaria: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RawMovementsResponse {
    #[serde(default)]
    pub movimentacoes: Vec<RawMovement>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawMovement {
    pub id: String,
    pub data: DateTime<Utc>,
    pub tipo: String,
    pub descricao: String,
    pub juiz: Option<String>,
    pub publicacao: Option<DateTime<Utc>>,
    pub prazo: Option<RawDeadline>,
    #[serde(rename = "documentosAnexados", default)]
    pub documentos_anexados: Vec<RawDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDeadline {
    pub dias: i64,
    pub vencimento: DateTime<Utc>,
    #[serde(rename = "tipoRecurso")]
    pub tipo_recurso: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    pub id: String,
    pub nome: String,
    pub tipo: String,
    pub tamanho: u64,
    pub hash: Option<String>,
}

pub(crate) fn normalize_process(raw: RawProcess) -> JudicialProcess {
    JudicialProcess {
        process_number: raw.numero,
        tribunal: raw.tribunal.unwrap_or_else(|| "TJ-SP".to_string()),
        subject: raw.assunto,
        filed_at: raw.data_ajuizamento,
        status: raw.status,
        phase: raw.fase,
        judge: raw.juiz.map(|j| j.nome),
        venue: raw.juizado,
        parties: raw.partes.into_iter().map(normalize_party).collect(),
        claim_value: raw.valor.map(|v| ClaimValue {
            nominal: v.inicial,
            adjusted: v.atualizado,
            correction_index: v.correcao_monetaria,
        }),
    }
}

fn normalize_party(raw: RawParty) -> Party {
    let role = match raw.tipo.as_str() {
        "autor" => PartyRole::Claimant,
        "reu" => PartyRole::Respondent,
        _ => PartyRole::ThirdParty,
    };
    Party {
        name: raw.nome,
        role,
        document_id: raw.cpf.or(raw.cnpj),
        counsel: raw.advogado.map(|a| Counsel {
            name: a.nome,
            bar_registration: a.oab,
        }),
    }
}

/// The criticality flag is always derived from `now`; whatever the source
/// claims about its own deadlines is ignored.
pub(crate) fn normalize_movement(raw: RawMovement, now: DateTime<Utc>) -> ProcessMovement {
    ProcessMovement {
        id: raw.id,
        occurred_at: raw.data,
        category: raw.tipo,
        description: raw.descricao,
        judge: raw.juiz,
        published_at: raw.publicacao,
        deadline: raw.prazo.map(|p| Deadline {
            day_count: p.dias,
            due_at: p.vencimento,
            recourse_type: p.tipo_recurso,
            critical: Deadline::is_critical(p.vencimento, now),
        }),
        documents: raw
            .documentos_anexados
            .into_iter()
            .map(|d| ProcessDocument {
                id: d.id,
                name: d.nome,
                category: d.tipo,
                size_bytes: d.tamanho,
                content_hash: d.hash,
            })
            .collect(),
    }
}
