mod common;

use chrono::Utc;
use common::{advice, MemoryStore};
use mindset::advice::Role;
use mindset::record::GameResult;
use mindset::session::{MatchSession, SessionError, SessionManager};
use mindset::MindsetError;
use mindset::store::StoreError;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

fn knowledge() -> Vec<mindset::advice::Advice> {
  vec![
    advice("Ward the enemy raptors at 2:45", "General", "General"),
    advice("Shove wave before roaming", "Mid", "General"),
    advice("Save charm for the dive", "General", "Ahri"),
    advice("Track the jungler's first clear", "Mid, Jungle", "General"),
    advice("Orb the wave from max range", "Mid", "Ahri, Lux"),
    advice("Take the top plate first", "Top", "General"),
    advice("Engage from fog", "Support", "Thresh"),
  ]
}

#[tokio::test]
async fn test_three_of_five_checked() {
  let store = MemoryStore::with_knowledge(knowledge());
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), Some(GameResult::Win)).unwrap();

  let total = session.begin_review(&store).await.unwrap();
  assert_eq!(total, 5);

  for index in [0, 2, 4] {
    assert!(session.toggle(index).unwrap());
  }
  assert_eq!(session.achievement_preview(), Some(60.0));

  let record = session.save(&store, Utc::now()).await.unwrap();
  assert_eq!(record.achievement_rate, 60.0);
  assert_eq!(record.checked_count, 3);
  assert_eq!(record.total_count, 5);
  assert_eq!(record.role, "Mid");
  assert_eq!(record.result, GameResult::Win);

  assert_eq!(store.records(), vec![record]);
  assert_eq!(session, MatchSession::default());
}

#[tokio::test]
async fn test_no_matching_advice_still_saves() {
  let store = MemoryStore::with_knowledge(vec![advice("Engage from fog", "Support", "Thresh")]);
  let mut session = MatchSession::new();
  session.configure(Some(Role::Top), Some("Garen"), Some(GameResult::Loss)).unwrap();

  assert_eq!(session.begin_review(&store).await.unwrap(), 0);
  let record = session.save(&store, Utc::now()).await.unwrap();

  assert_eq!((record.achievement_rate, record.checked_count, record.total_count), (0.0, 0, 0));
  assert_eq!(record.result, GameResult::Loss);
}

#[tokio::test]
async fn test_save_failure_then_retry_does_not_refetch() {
  let store = MemoryStore::with_knowledge(knowledge());
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
  session.begin_review(&store).await.unwrap();
  session.toggle(1).unwrap();
  session.set_note("Forgot to ward").unwrap();

  store.fail_writes.store(true, Ordering::SeqCst);
  let err = session.save(&store, Utc::now()).await.unwrap_err();
  assert!(matches!(err, SessionError::Save(StoreError::Http { status: 503, .. })));
  assert!(session.is_reviewing());
  assert_eq!(session.checklist().unwrap().note, "Forgot to ward");

  store.fail_writes.store(false, Ordering::SeqCst);
  let record = session.save(&store, Utc::now()).await.unwrap();
  assert_eq!(record.checked_count, 1);
  assert_eq!(record.note, "Forgot to ward");
  assert_eq!(store.fetches(), 1);
  assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_snapshot_is_not_revalidated() {
  let store = MemoryStore::with_knowledge(knowledge());
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
  session.begin_review(&store).await.unwrap();

  store.knowledge.lock().unwrap().push(advice("New general tip", "General", "General"));
  assert_eq!(session.checklist().unwrap().total(), 5);
}

#[tokio::test]
async fn test_back_then_restart_reloads() {
  let store = MemoryStore::with_knowledge(knowledge());
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
  session.begin_review(&store).await.unwrap();
  session.toggle(0).unwrap();

  session.back().unwrap();
  assert!(!session.is_reviewing());
  assert!(store.records().is_empty());

  session.configure(Some(Role::Support), Some("Thresh"), None).unwrap();
  assert_eq!(session.begin_review(&store).await.unwrap(), 2);
  assert!(session.checklist().unwrap().checked.is_empty());
}

#[tokio::test]
async fn test_load_failure_keeps_configuring() {
  let store = MemoryStore::with_knowledge(knowledge());
  store.fail_reads.store(true, Ordering::SeqCst);

  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
  let err = session.begin_review(&store).await.unwrap_err();

  assert!(matches!(err, SessionError::Load(StoreError::Transport { .. })));
  assert!(!session.is_reviewing());
}

#[tokio::test]
async fn test_unconfigured_target_blocks_review() {
  let store = MemoryStore { unconfigured: true, ..Default::default() };
  let mut session = MatchSession::new();
  session.configure(None, Some("Ahri"), None).unwrap();

  assert_eq!(session.begin_review(&store).await, Err(SessionError::NoPersistenceTarget));
  assert_eq!(store.fetches(), 0);
}

#[tokio::test]
async fn test_toggle_twice_restores_checked_set() {
  let store = MemoryStore::with_knowledge(knowledge());
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), None).unwrap();
  session.begin_review(&store).await.unwrap();

  session.toggle(3).unwrap();
  let before = session.checklist().unwrap().checked.clone();
  session.toggle(1).unwrap();
  session.toggle(1).unwrap();
  assert_eq!(session.checklist().unwrap().checked, before);
}

async fn saved_review(manager: &SessionManager, store: &MemoryStore) {
  let mut session = MatchSession::new();
  session.configure(Some(Role::Mid), Some("Ahri"), Some(GameResult::Win)).unwrap();
  session.begin_review(store).await.unwrap();
  session.toggle(0).unwrap();
  manager.save(&session).unwrap();
}

#[tokio::test]
async fn test_session_is_recorded_once_across_commands() {
  let dir = TempDir::new().unwrap();
  let manager = SessionManager::new(dir.path());
  let store = MemoryStore::with_knowledge(knowledge());
  saved_review(&manager, &store).await;

  // A save already in flight in another process holds the lock
  let in_flight = manager.lock().unwrap();
  let err = manager.record(&store, Utc::now()).await.unwrap_err();
  assert!(matches!(err, MindsetError::Busy { .. }));
  assert!(store.records().is_empty());
  assert!(manager.load().unwrap().is_reviewing());
  drop(in_flight);

  let record = manager.record(&store, Utc::now()).await.unwrap();
  assert_eq!(record.checked_count, 1);
  assert!(!manager.session_exists());

  let err = manager.record(&store, Utc::now()).await.unwrap_err();
  assert!(matches!(err, MindsetError::Session(SessionError::NotReviewing)));
  assert_eq!(store.records().len(), 1);
}

#[tokio::test]
async fn test_failed_record_keeps_session_and_releases_lock() {
  let dir = TempDir::new().unwrap();
  let manager = SessionManager::new(dir.path());
  let store = MemoryStore::with_knowledge(knowledge());
  saved_review(&manager, &store).await;

  store.fail_writes.store(true, Ordering::SeqCst);
  let err = manager.record(&store, Utc::now()).await.unwrap_err();
  assert!(matches!(err, MindsetError::Session(SessionError::Save(_))));
  assert!(manager.load().unwrap().is_reviewing());

  store.fail_writes.store(false, Ordering::SeqCst);
  manager.record(&store, Utc::now()).await.unwrap();
  assert_eq!(store.records().len(), 1);
}
