//! The knowledge store: advice rows and match-history rows kept in a spreadsheet
//!
//! Two logical tables, both append-only from this tool's point of view. Rows are
//! never updated or deleted here; edits happen by hand in the sheet itself.

use async_trait::async_trait;
use thiserror::Error;

use crate::advice::Advice;
use crate::record::MatchRecord;

pub mod rows;
pub mod sheets;

pub use sheets::SheetsStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
  #[error("Spreadsheet access was refused: {message}")]
  Unauthorized { message: String },

  #[error("Spreadsheet or tab not found: {message}")]
  NotFound { message: String },

  #[error("Spreadsheet request failed (HTTP {status}): {message}")]
  Http { status: u16, message: String },

  #[error("Could not reach the spreadsheet service: {message}")]
  Transport { message: String },

  #[error("Unexpected spreadsheet response: {message}")]
  Decode { message: String },
}

impl StoreError {
  pub fn remediation(&self) -> String {
    match self {
      StoreError::Unauthorized { .. } => {
        "Your Google sign-in expired or lacks spreadsheet access. Run `mindset login`.".to_string()
      }
      StoreError::NotFound { .. } => format!(
        "Check the spreadsheet id with `mindset config show`; the sheet needs '{}' and '{}' tabs.",
        rows::KNOWLEDGE_TAB,
        rows::HISTORY_TAB
      ),
      _ => "Nothing was lost. Run the same command again to retry.".to_string(),
    }
  }

  /// Access problems are fixed by signing in again rather than retrying
  pub fn is_auth(&self) -> bool {
    matches!(self, StoreError::Unauthorized { .. })
  }
}

impl From<reqwest::Error> for StoreError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      StoreError::Decode { message: e.to_string() }
    } else {
      StoreError::Transport { message: e.to_string() }
    }
  }
}

/// Where advice and match records live
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
  /// Whether a persistence target has been set up at all
  fn is_configured(&self) -> bool;

  /// All stored advice in sheet order
  async fn fetch_knowledge_base(&self) -> Result<Vec<Advice>, StoreError>;

  async fn append_advice(&self, advice: &[Advice]) -> Result<(), StoreError>;

  /// Every match record in insertion order
  async fn fetch_match_history(&self) -> Result<Vec<MatchRecord>, StoreError>;

  async fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError>;
}
