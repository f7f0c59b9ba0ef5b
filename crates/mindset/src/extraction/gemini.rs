//! Gemini `generateContent` client with Google Search grounding
//!
//! The model is asked to watch the video through search grounding and answer
//! with a JSON object. Grounding and a JSON response mime type cannot be combined,
//! so the answer is free text and gets scraped by `parse_advice_text`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{classify_failure, parse_advice_text, ExtractionError, ExtractionRequest, ExtractionService};
use crate::advice::RawAdvice;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  system_instruction: Content,
  contents: Vec<Content>,
  tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
  google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  #[serde(default)]
  content: Content,
}

impl Content {
  fn text(text: String, role: Option<&str>) -> Self {
    Self { role: role.map(str::to_string), parts: vec![Part { text: Some(text) }] }
  }
}

/// Advice extraction backed by a Gemini model
pub struct GeminiExtractor {
  http: Client,
  api_key: String,
  model: String,
  language: String,
  base_url: String,
}

impl GeminiExtractor {
  /// # Arguments
  /// * `api_key` - Gemini API key
  /// * `model` - model name, e.g. "gemini-2.5-flash"
  /// * `language` - language the advice text is written in, e.g. "Japanese"
  pub fn new(
    http: Client,
    api_key: impl Into<String>,
    model: impl Into<String>,
    language: impl Into<String>,
  ) -> Self {
    Self {
      http,
      api_key: api_key.into(),
      model: model.into(),
      language: language.into(),
      base_url: GEMINI_API_BASE.to_string(),
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }

  pub fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
  }

  pub fn system_instruction(&self) -> String {
    format!(
      "You are an expert League of Legends coach.\n\
       Your task is to analyze the content of a provided YouTube video URL (using Google Search \
       grounding) and extract specific, actionable mindset or gameplay advice.\n\
       \n\
       Rules:\n\
       1. Focus on specific habits, decision-making rules, or mechanical tips.\n\
       2. Ignore generic fluff.\n\
       3. Determine the Role (Top, Jungle, Mid, ADC, Support, or General).\n\
       4. Determine the Champion if specific (or General).\n\
       5. Categorize into: Laning, Teamfight, Vision, Macro, or Mental.\n\
       6. Rate importance: High, Medium, Low.\n\
       7. The 'content' of the advice MUST be written in {language}.\n\
       \n\
       Output strictly valid JSON.\n\
       Structure: {{ \"adviceList\": [ {{ \"content\": \"...\", \"role_tags\": \"...\", \
       \"champion_tags\": \"...\", \"category\": \"...\", \"importance\": \"...\" }} ] }}",
      language = self.language
    )
  }

  pub fn user_prompt(&self, request: &ExtractionRequest) -> String {
    let notes = if request.notes.trim().is_empty() { "none" } else { request.notes.trim() };
    format!(
      "Analyze this LoL video: {url}.\n\
       Additional context: {notes}.\n\
       \n\
       Extract actionable advice items.\n\
       Return a JSON object with a key 'adviceList' containing an array of items.\n\
       Ensure the 'content' field is written in {language}.",
      url = request.video_url.trim(),
      notes = notes,
      language = self.language
    )
  }

  fn build_request(&self, request: &ExtractionRequest) -> GenerateRequest {
    GenerateRequest {
      system_instruction: Content::text(self.system_instruction(), None),
      contents: vec![Content::text(self.user_prompt(request), Some("user"))],
      tools: vec![Tool { google_search: serde_json::Map::new() }],
    }
  }
}

fn answer_text(response: GenerateResponse) -> String {
  response
    .candidates
    .into_iter()
    .next()
    .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
    .unwrap_or_default()
}

#[async_trait]
impl ExtractionService for GeminiExtractor {
  async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<RawAdvice>, ExtractionError> {
    let body = self.build_request(request);
    tracing::debug!(model = %self.model, url = %request.video_url, "requesting advice extraction");

    let response = self
      .http
      .post(self.endpoint())
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| classify_failure(e.status().map(|s| s.as_u16()), &e.to_string()))?;

    let status = response.status();
    tracing::debug!(%status, "extraction response received");

    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      return Err(classify_failure(Some(status.as_u16()), &detail));
    }

    let parsed: GenerateResponse = response.json().await.map_err(|e| {
      ExtractionError::Unrecognized { message: format!("unexpected extraction response: {e}") }
    })?;

    let advice = parse_advice_text(&answer_text(parsed))?;
    tracing::debug!(items = advice.len(), "advice extracted");
    Ok(advice)
  }
}

impl std::fmt::Debug for GeminiExtractor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GeminiExtractor")
      .field("model", &self.model)
      .field("language", &self.language)
      .field("base_url", &self.base_url)
      .field("api_key", &"[REDACTED]")
      .finish()
  }
}
