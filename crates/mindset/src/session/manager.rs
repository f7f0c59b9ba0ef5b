use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::{MatchSession, SessionError};
use crate::record::MatchRecord;
use crate::state::{self, StateLock};
use crate::store::KnowledgeStore;
use crate::Result;

pub const SESSION_FILE: &str = "session.json";
pub const SESSION_LOCK: &str = "session.lock";

/// Keeps the in-progress match session between invocations
pub struct SessionManager {
  dir: PathBuf,
}

impl SessionManager {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn session_file(&self) -> PathBuf {
    self.dir.join(SESSION_FILE)
  }

  pub fn session_exists(&self) -> bool {
    self.session_file().exists()
  }

  /// Exclusive hold on the session for one command
  pub fn lock(&self) -> Result<StateLock> {
    StateLock::acquire(self.dir.join(SESSION_LOCK))
  }

  /// The saved session, or a fresh one in configuration
  pub fn load(&self) -> Result<MatchSession> {
    Ok(state::read_json(&self.session_file())?.unwrap_or_default())
  }

  pub fn save(&self, session: &MatchSession) -> Result<()> {
    state::write_json(&self.session_file(), session)
  }

  pub fn clear(&self) -> Result<()> {
    state::remove(&self.session_file())
  }

  /// Record the saved session and clear it, holding the session lock
  /// throughout so the match is appended at most once.
  pub async fn record(&self, store: &dyn KnowledgeStore, now: DateTime<Utc>) -> Result<MatchRecord> {
    let _lock = self.lock()?;
    let mut session = self.load()?;
    if !session.is_reviewing() {
      return Err(SessionError::NotReviewing.into());
    }

    let record = session.save(store, now).await?;
    self.clear()?;
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::GameResult;
  use tempfile::TempDir;

  #[test]
  fn test_missing_file_is_fresh_session() {
    let dir = TempDir::new().unwrap();
    let manager = SessionManager::new(dir.path());
    assert!(!manager.session_exists());
    assert_eq!(manager.load().unwrap(), MatchSession::default());
  }

  #[test]
  fn test_save_load_clear() {
    let dir = TempDir::new().unwrap();
    let manager = SessionManager::new(dir.path().join("nested"));

    let mut session = MatchSession::new();
    session.configure(None, Some("Lux"), Some(GameResult::Loss)).unwrap();
    manager.save(&session).unwrap();
    assert_eq!(manager.load().unwrap(), session);

    manager.clear().unwrap();
    assert!(!manager.session_exists());
  }

  #[test]
  fn test_truncated_session_points_at_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(SESSION_FILE), "{\"setup\":").unwrap();

    let err = SessionManager::new(dir.path()).load().unwrap_err();
    assert!(err.remediation().contains(SESSION_FILE));
  }
}
