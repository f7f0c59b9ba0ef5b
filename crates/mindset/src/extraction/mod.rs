//! Turning a coaching video into candidate advice
//!
//! The service only ever hands back `RawAdvice`. Either the whole list comes
//! back or an error does; nothing is half-applied.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use thiserror::Error;

use crate::advice::RawAdvice;

pub mod gemini;

pub use gemini::GeminiExtractor;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
  #[error("The extraction API key is invalid or has been revoked: {message}")]
  InvalidCredential { message: String },

  #[error("The extraction API quota or rate limit is exhausted: {message}")]
  QuotaExceeded { message: String },

  #[error("Video analysis failed: {message}")]
  Unrecognized { message: String },
}

impl ExtractionError {
  pub fn remediation(&self) -> String {
    match self {
      ExtractionError::InvalidCredential { .. } => {
        "Create a new Gemini API key and store it with `mindset config set --gemini-key <KEY>`."
          .to_string()
      }
      ExtractionError::QuotaExceeded { .. } => {
        "Wait a minute and try again, or check the key's quota and billing in Google AI Studio."
          .to_string()
      }
      ExtractionError::Unrecognized { .. } => {
        "Check that the URL points to a public video and that the configured model is available, \
         then run the analysis again."
          .to_string()
      }
    }
  }
}

/// What the user asked to analyze
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
  pub video_url: String,
  pub notes: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionService: Send + Sync {
  async fn extract(&self, request: &ExtractionRequest) -> Result<Vec<RawAdvice>, ExtractionError>;
}

/// Sort a failure into one of the three classes the user gets distinct advice for.
///
/// `status` is the HTTP status when there was a response at all; `detail` is the
/// response body or transport error text.
pub fn classify_failure(status: Option<u16>, detail: &str) -> ExtractionError {
  let message = detail.trim().to_string();
  let lowered = message.to_lowercase();

  let quota = status == Some(429)
    || lowered.contains("resource_exhausted")
    || lowered.contains("quota")
    || lowered.contains("rate limit");
  if quota {
    return ExtractionError::QuotaExceeded { message };
  }

  let credential = matches!(status, Some(401) | Some(403))
    || lowered.contains("api_key_invalid")
    || lowered.contains("api key not valid")
    || lowered.contains("api key expired")
    || lowered.contains("permission_denied");
  if credential {
    return ExtractionError::InvalidCredential { message };
  }

  ExtractionError::Unrecognized { message }
}

#[derive(Debug, Deserialize)]
struct AdviceEnvelope {
  #[serde(default, rename = "adviceList")]
  advice_list: Option<Vec<RawAdvice>>,
}

fn json_object_span() -> Option<&'static Regex> {
  static SPAN: OnceLock<Option<Regex>> = OnceLock::new();
  SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").ok()).as_ref()
}

/// Pull the advice list out of the model's free-text answer.
///
/// The answer may wrap the JSON in a markdown fence or chatter around it, so the
/// outermost `{…}` span is parsed. An empty answer or a missing `adviceList`
/// yields no advice; JSON that does not parse is a failure.
pub fn parse_advice_text(text: &str) -> Result<Vec<RawAdvice>, ExtractionError> {
  if text.trim().is_empty() {
    return Ok(Vec::new());
  }

  let candidate =
    json_object_span().and_then(|span| span.find(text)).map(|m| m.as_str()).unwrap_or(text);
  let envelope: AdviceEnvelope = serde_json::from_str(candidate).map_err(|e| {
    ExtractionError::Unrecognized { message: format!("model answer was not valid JSON: {e}") }
  })?;

  Ok(envelope.advice_list.unwrap_or_default())
}
