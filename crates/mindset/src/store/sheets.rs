//! Google Sheets v4 backed knowledge store

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::rows::{self, HISTORY_TAB, KNOWLEDGE_TAB};
use super::{KnowledgeStore, StoreError};
use crate::advice::Advice;
use crate::record::MatchRecord;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
  #[serde(default)]
  values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct AppendBody {
  values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
  error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
  #[serde(default)]
  message: String,
}

/// One spreadsheet, reached with a bearer token obtained by the caller
pub struct SheetsStore {
  http: Client,
  base_url: String,
  spreadsheet_id: String,
  access_token: String,
}

impl SheetsStore {
  pub fn new(
    http: Client,
    spreadsheet_id: impl Into<String>,
    access_token: impl Into<String>,
  ) -> Self {
    Self {
      http,
      base_url: SHEETS_API_BASE.to_string(),
      spreadsheet_id: spreadsheet_id.into(),
      access_token: access_token.into(),
    }
  }

  /// Point the store somewhere other than Google, for local fakes
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn spreadsheet_id(&self) -> &str {
    &self.spreadsheet_id
  }

  /// `{base}/{id}/values/{range}[:append]`, each part encoded as one path segment
  pub fn values_url(&self, range: &str, append: bool) -> Result<Url, StoreError> {
    let mut url = Url::parse(&self.base_url)
      .map_err(|e| StoreError::Decode { message: format!("bad sheets base url: {e}") })?;

    let last = if append { format!("{range}:append") } else { range.to_string() };
    url
      .path_segments_mut()
      .map_err(|_| StoreError::Decode { message: "sheets base url cannot take a path".to_string() })?
      .pop_if_empty()
      .push(&self.spreadsheet_id)
      .push("values")
      .push(&last);

    if append {
      url
        .query_pairs_mut()
        .append_pair("valueInputOption", "USER_ENTERED")
        .append_pair("insertDataOption", "INSERT_ROWS");
    }

    Ok(url)
  }

  async fn get_values(&self, range: &str) -> Result<Vec<Vec<Value>>, StoreError> {
    let url = self.values_url(range, false)?;
    tracing::debug!(%range, "reading sheet values");

    let response = self.http.get(url).bearer_auth(&self.access_token).send().await?;
    let status = response.status();
    tracing::debug!(%range, %status, "sheet read finished");

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(status_error(status, &body));
    }

    let payload: ValueRange = response.json().await?;
    Ok(payload.values)
  }

  async fn append_values(&self, range: &str, values: Vec<Vec<Value>>) -> Result<(), StoreError> {
    let url = self.values_url(range, true)?;
    tracing::debug!(%range, rows = values.len(), "appending sheet rows");

    let response = self
      .http
      .post(url)
      .bearer_auth(&self.access_token)
      .json(&AppendBody { values })
      .send()
      .await?;
    let status = response.status();
    tracing::debug!(%range, %status, "sheet append finished");

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(status_error(status, &body));
    }

    Ok(())
  }
}

/// Map a failed sheets response onto the store's error classes
pub fn status_error(status: StatusCode, body: &str) -> StoreError {
  let message = serde_json::from_str::<GoogleErrorEnvelope>(body)
    .map(|envelope| envelope.error.message)
    .ok()
    .filter(|m| !m.is_empty())
    .unwrap_or_else(|| {
      let trimmed = body.trim();
      if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("no response body").to_string()
      } else {
        trimmed.to_string()
      }
    });

  match status {
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized { message },
    StatusCode::NOT_FOUND => StoreError::NotFound { message },
    // Sheets answers 400 for an unknown tab in the range
    StatusCode::BAD_REQUEST if message.contains("Unable to parse range") => {
      StoreError::NotFound { message }
    }
    _ => StoreError::Http { status: status.as_u16(), message },
  }
}

#[async_trait]
impl KnowledgeStore for SheetsStore {
  fn is_configured(&self) -> bool {
    !self.spreadsheet_id.trim().is_empty()
  }

  async fn fetch_knowledge_base(&self) -> Result<Vec<Advice>, StoreError> {
    let values = self.get_values(&rows::read_range(KNOWLEDGE_TAB)).await?;
    Ok(values.iter().filter(|row| !rows::is_blank(row)).map(|row| rows::advice_from_row(row)).collect())
  }

  async fn append_advice(&self, advice: &[Advice]) -> Result<(), StoreError> {
    if advice.is_empty() {
      return Ok(());
    }
    let values = advice.iter().map(rows::advice_to_row).collect();
    self.append_values(&rows::append_range(KNOWLEDGE_TAB), values).await
  }

  async fn fetch_match_history(&self) -> Result<Vec<MatchRecord>, StoreError> {
    let values = self.get_values(&rows::read_range(HISTORY_TAB)).await?;
    Ok(values.iter().filter(|row| !rows::is_blank(row)).map(|row| rows::record_from_row(row)).collect())
  }

  async fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError> {
    self.append_values(&rows::append_range(HISTORY_TAB), vec![rows::record_to_row(record)]).await
  }
}

impl std::fmt::Debug for SheetsStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SheetsStore")
      .field("base_url", &self.base_url)
      .field("spreadsheet_id", &self.spreadsheet_id)
      .field("access_token", &"[REDACTED]")
      .finish()
  }
}
