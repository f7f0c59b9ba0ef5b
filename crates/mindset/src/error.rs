use std::path::PathBuf;
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::extraction::ExtractionError;
use crate::session::SessionError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, MindsetError>;

/// Every failure a mindset action can end with.
///
/// None of these are fatal to the workflow: the action that raised it stops, and
/// whatever state existed before it (configured match, checklist, pending
/// extraction) is left intact for the user to retry.
#[derive(Error, Debug)]
pub enum MindsetError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error(transparent)]
  Extraction(#[from] ExtractionError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Malformed local state: {0}")]
  LocalState(#[from] serde_json::Error),

  #[error("{} is unreadable: {message}", path.display())]
  CorruptState { path: PathBuf, message: String },

  #[error("Another mindset command is already working on this ({})", path.display())]
  Busy { path: PathBuf },
}

impl MindsetError {
  /// What the user should do about it
  pub fn remediation(&self) -> String {
    match self {
      MindsetError::Config(e) => e.remediation(),
      MindsetError::Auth(e) => e.remediation(),
      MindsetError::Extraction(e) => e.remediation(),
      MindsetError::Store(e) => e.remediation(),
      MindsetError::Session(e) => e.remediation(),
      MindsetError::Io(_) | MindsetError::LocalState(_) => {
        "Check that the mindset directory ($MINDSET_DIR or ~/.mindset) is writable.".to_string()
      }
      MindsetError::CorruptState { path, .. } => {
        format!("Delete {} to start over; nothing in the spreadsheet is affected.", path.display())
      }
      MindsetError::Busy { path } => format!(
        "Wait for the other command to finish. If none is running, delete {} and retry.",
        path.display()
      ),
    }
  }
}
