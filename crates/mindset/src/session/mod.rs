//! The match review workflow
//!
//! A session is either being configured (role, champion, result) or reviewing
//! a checklist snapshot of the advice that applies to that match. Saving turns
//! the checklist into a `MatchRecord` and starts over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::advice::{Advice, Role};
use crate::matcher::match_advice;
use crate::record::{achievement_rate, GameResult, MatchRecord};
use crate::store::{KnowledgeStore, StoreError};

pub mod manager;

pub use manager::SessionManager;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
  #[error("A champion is required before the checklist can start")]
  EmptySubject,

  #[error("No spreadsheet is configured to load advice from or save the match to")]
  NoPersistenceTarget,

  #[error("No checklist is in progress")]
  NotReviewing,

  #[error("A checklist is already in progress for {subject}")]
  AlreadyReviewing { subject: String },

  #[error("There is no item {number}; the checklist has {total} item(s)")]
  ItemOutOfRange { number: usize, total: usize },

  #[error("Could not load the knowledge base: {0}")]
  Load(StoreError),

  #[error("Could not save the match: {0}")]
  Save(StoreError),
}

impl SessionError {
  pub fn remediation(&self) -> String {
    match self {
      SessionError::EmptySubject => {
        "Pass the champion you are playing, e.g. `mindset review start --subject Ahri`.".to_string()
      }
      SessionError::NoPersistenceTarget => {
        "Set the spreadsheet with `mindset config set --spreadsheet-id <ID>`.".to_string()
      }
      SessionError::NotReviewing => "Start one with `mindset review start`.".to_string(),
      SessionError::AlreadyReviewing { .. } => {
        "Finish it with `mindset review save`, or drop it with `mindset review back`.".to_string()
      }
      SessionError::ItemOutOfRange { .. } => {
        "Run `mindset review status` to see the item numbers.".to_string()
      }
      SessionError::Load(e) => e.remediation(),
      SessionError::Save(e) => {
        format!("{} Your checklist and note are kept; run `mindset review save` again.", e.remediation())
      }
    }
  }
}

/// The match being reviewed
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchSetup {
  pub role: Role,
  pub subject: String,
  pub result: GameResult,
}

/// Snapshot of matched advice plus what the user has ticked so far
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Checklist {
  pub items: Vec<Advice>,
  /// Zero-based indices into `items`
  pub checked: BTreeSet<usize>,
  pub note: String,
}

impl Checklist {
  pub fn new(items: Vec<Advice>) -> Self {
    Self { items, checked: BTreeSet::new(), note: String::new() }
  }

  pub fn is_checked(&self, index: usize) -> bool {
    self.checked.contains(&index)
  }

  pub fn checked_count(&self) -> usize {
    self.checked.len()
  }

  pub fn total(&self) -> usize {
    self.items.len()
  }

  pub fn achievement_rate(&self) -> f64 {
    achievement_rate(self.checked_count(), self.total())
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Configuring,
  Reviewing(Checklist),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchSession {
  pub setup: MatchSetup,
  pub phase: Phase,
}

impl MatchSession {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_reviewing(&self) -> bool {
    matches!(self.phase, Phase::Reviewing(_))
  }

  pub fn checklist(&self) -> Option<&Checklist> {
    match &self.phase {
      Phase::Reviewing(checklist) => Some(checklist),
      Phase::Configuring => None,
    }
  }

  fn checklist_mut(&mut self) -> Result<&mut Checklist, SessionError> {
    match &mut self.phase {
      Phase::Reviewing(checklist) => Ok(checklist),
      Phase::Configuring => Err(SessionError::NotReviewing),
    }
  }

  /// Change any part of the setup. Only allowed before the checklist starts.
  pub fn configure(
    &mut self,
    role: Option<Role>,
    subject: Option<&str>,
    result: Option<GameResult>,
  ) -> Result<(), SessionError> {
    if self.is_reviewing() {
      return Err(SessionError::AlreadyReviewing { subject: self.setup.subject.clone() });
    }
    if let Some(role) = role {
      self.setup.role = role;
    }
    if let Some(subject) = subject {
      self.setup.subject = subject.trim().to_string();
    }
    if let Some(result) = result {
      self.setup.result = result;
    }
    Ok(())
  }

  /// Whether the setup is complete enough to start the checklist
  pub fn ready_to_review(&self) -> Result<(), SessionError> {
    if self.is_reviewing() {
      return Err(SessionError::AlreadyReviewing { subject: self.setup.subject.clone() });
    }
    if self.setup.subject.trim().is_empty() {
      return Err(SessionError::EmptySubject);
    }
    Ok(())
  }

  /// Load the knowledge base, match it against the setup and snapshot the
  /// result as the checklist. Returns the number of checklist items.
  ///
  /// On failure the session stays in configuration, unchanged.
  pub async fn begin_review(&mut self, store: &dyn KnowledgeStore) -> Result<usize, SessionError> {
    self.ready_to_review()?;
    if !store.is_configured() {
      return Err(SessionError::NoPersistenceTarget);
    }

    let knowledge = store.fetch_knowledge_base().await.map_err(SessionError::Load)?;
    let items = match_advice(&knowledge, self.setup.role, &self.setup.subject);
    tracing::debug!(
      stored = knowledge.len(),
      matched = items.len(),
      role = %self.setup.role,
      subject = %self.setup.subject,
      "checklist snapshot taken"
    );

    let total = items.len();
    self.phase = Phase::Reviewing(Checklist::new(items));
    Ok(total)
  }

  /// Flip one item, addressed by its zero-based position. Returns whether it is
  /// now checked.
  pub fn toggle(&mut self, index: usize) -> Result<bool, SessionError> {
    let checklist = self.checklist_mut()?;
    if index >= checklist.total() {
      return Err(SessionError::ItemOutOfRange { number: index + 1, total: checklist.total() });
    }
    if checklist.checked.remove(&index) {
      Ok(false)
    } else {
      checklist.checked.insert(index);
      Ok(true)
    }
  }

  pub fn set_note(&mut self, note: &str) -> Result<(), SessionError> {
    self.checklist_mut()?.note = note.to_string();
    Ok(())
  }

  /// Drop the checklist and return to configuration, keeping the setup
  pub fn back(&mut self) -> Result<(), SessionError> {
    self.checklist_mut()?;
    self.phase = Phase::Configuring;
    Ok(())
  }

  /// Rate the current checklist would be saved with
  pub fn achievement_preview(&self) -> Option<f64> {
    self.checklist().map(Checklist::achievement_rate)
  }

  /// Record the match. On success the session starts over from defaults; on
  /// failure the checklist and note are left exactly as they were.
  pub async fn save(
    &mut self,
    store: &dyn KnowledgeStore,
    now: DateTime<Utc>,
  ) -> Result<MatchRecord, SessionError> {
    let checklist = self.checklist().ok_or(SessionError::NotReviewing)?;
    if !store.is_configured() {
      return Err(SessionError::NoPersistenceTarget);
    }

    let record = MatchRecord::completed(
      now,
      self.setup.role,
      &self.setup.subject,
      self.setup.result,
      checklist.checked_count(),
      checklist.total(),
      &checklist.note,
    );

    store.append_match_record(&record).await.map_err(SessionError::Save)?;
    tracing::info!(subject = %record.subject, rate = record.achievement_rate, "match recorded");

    *self = MatchSession::default();
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::advice::{Category, Importance};
  use crate::store::MockKnowledgeStore;
  use chrono::TimeZone;

  fn advice(content: &str, roles: &str, subjects: &str) -> Advice {
    Advice {
      timestamp: "2024-01-01T00:00:00.000Z".to_string(),
      source_title: "Video".to_string(),
      source_reference: "https://youtu.be/x".to_string(),
      content: content.to_string(),
      role_tags: roles.to_string(),
      subject_tags: subjects.to_string(),
      category: Category::Macro,
      importance: Importance::Medium,
    }
  }

  fn reviewing(items: usize) -> MatchSession {
    let items = (0..items).map(|i| advice(&format!("tip {i}"), "General", "General")).collect();
    MatchSession {
      setup: MatchSetup { role: Role::Mid, subject: "Ahri".to_string(), result: GameResult::Win },
      phase: Phase::Reviewing(Checklist::new(items)),
    }
  }

  #[tokio::test]
  async fn test_begin_requires_subject() {
    let mut store = MockKnowledgeStore::new();
    store.expect_fetch_knowledge_base().never();

    let mut session = MatchSession::new();
    session.configure(None, Some("   "), None).unwrap();
    assert_eq!(session.begin_review(&store).await, Err(SessionError::EmptySubject));
    assert!(!session.is_reviewing());
  }

  #[tokio::test]
  async fn test_begin_requires_persistence_target() {
    let mut store = MockKnowledgeStore::new();
    store.expect_is_configured().return_const(false);
    store.expect_fetch_knowledge_base().never();

    let mut session = MatchSession::new();
    session.configure(None, Some("Ahri"), None).unwrap();
    assert_eq!(session.begin_review(&store).await, Err(SessionError::NoPersistenceTarget));
  }

  #[tokio::test]
  async fn test_load_failure_stays_configuring() {
    let mut store = MockKnowledgeStore::new();
    store.expect_is_configured().return_const(true);
    store
      .expect_fetch_knowledge_base()
      .times(1)
      .returning(|| Err(StoreError::Transport { message: "offline".to_string() }));

    let mut session = MatchSession::new();
    session.configure(Some(Role::Top), Some("Garen"), Some(GameResult::Loss)).unwrap();
    let err = session.begin_review(&store).await.unwrap_err();

    assert!(matches!(err, SessionError::Load(_)));
    assert!(!session.is_reviewing());
    assert_eq!(session.setup.subject, "Garen");
  }

  #[tokio::test]
  async fn test_begin_snapshots_matches() {
    let mut store = MockKnowledgeStore::new();
    store.expect_is_configured().return_const(true);
    store.expect_fetch_knowledge_base().times(1).returning(|| {
      Ok(vec![
        advice("ward river", "General", "General"),
        advice("jungle only", "Jungle", "General"),
        advice("ahri combo", "Mid", "Ahri"),
      ])
    });

    let mut session = MatchSession::new();
    session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
    assert_eq!(session.begin_review(&store).await.unwrap(), 2);

    let contents: Vec<&str> =
      session.checklist().unwrap().items.iter().map(|a| a.content.as_str()).collect();
    assert_eq!(contents, vec!["ward river", "ahri combo"]);
  }

  #[test]
  fn test_toggle_twice_restores() {
    let mut session = reviewing(3);
    assert!(session.toggle(1).unwrap());
    assert!(!session.toggle(1).unwrap());
    assert!(session.checklist().unwrap().checked.is_empty());
  }

  #[test]
  fn test_toggle_out_of_range() {
    let mut session = reviewing(2);
    assert_eq!(session.toggle(2), Err(SessionError::ItemOutOfRange { number: 3, total: 2 }));
    assert_eq!(MatchSession::new().toggle(0), Err(SessionError::NotReviewing));
  }

  #[test]
  fn test_back_keeps_setup() {
    let mut session = reviewing(2);
    session.toggle(0).unwrap();
    session.back().unwrap();

    assert!(!session.is_reviewing());
    assert_eq!(session.setup.subject, "Ahri");
    assert_eq!(session.back(), Err(SessionError::NotReviewing));
  }

  #[test]
  fn test_configure_blocked_while_reviewing() {
    let mut session = reviewing(1);
    let err = session.configure(None, Some("Zed"), None).unwrap_err();
    assert_eq!(err, SessionError::AlreadyReviewing { subject: "Ahri".to_string() });
  }

  #[tokio::test]
  async fn test_save_failure_keeps_checklist() {
    let mut store = MockKnowledgeStore::new();
    store.expect_is_configured().return_const(true);
    store
      .expect_append_match_record()
      .times(1)
      .returning(|_| Err(StoreError::Http { status: 503, message: "unavailable".to_string() }));

    let mut session = reviewing(4);
    session.toggle(0).unwrap();
    session.set_note("lost lane").unwrap();
    let before = session.clone();

    let err = session.save(&store, Utc::now()).await.unwrap_err();
    assert!(matches!(err, SessionError::Save(_)));
    assert!(err.remediation().contains("review save"));
    assert_eq!(session, before);
  }

  #[tokio::test]
  async fn test_save_resets_session() {
    let mut store = MockKnowledgeStore::new();
    store.expect_is_configured().return_const(true);
    store
      .expect_append_match_record()
      .withf(|record| record.checked_count == 1 && record.total_count == 4)
      .times(1)
      .returning(|_| Ok(()));

    let mut session = reviewing(4);
    session.toggle(2).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let record = session.save(&store, now).await.unwrap();

    assert_eq!(record.achievement_rate, 25.0);
    assert_eq!(record.timestamp, "2024-05-01T12:00:00.000Z");
    assert_eq!(session, MatchSession::default());
  }

  #[test]
  fn test_session_json_shape() {
    let json = serde_json::to_value(reviewing(1)).unwrap();
    assert_eq!(json["phase"]["state"], "reviewing");
    assert_eq!(json["setup"]["role"], "Mid");

    let restored: MatchSession = serde_json::from_value(json).unwrap();
    assert!(restored.is_reviewing());
  }
}
