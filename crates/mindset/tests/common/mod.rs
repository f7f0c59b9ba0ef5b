#![allow(dead_code)]

use async_trait::async_trait;
use mindset::advice::{Advice, Category, Importance};
use mindset::record::{GameResult, MatchRecord};
use mindset::store::{KnowledgeStore, StoreError};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// In-memory knowledge store with switchable failures
#[derive(Default)]
pub struct MemoryStore {
  pub knowledge: Mutex<Vec<Advice>>,
  pub history: Mutex<Vec<MatchRecord>>,
  pub unconfigured: bool,
  pub fail_reads: AtomicBool,
  pub fail_writes: AtomicBool,
  pub fetch_calls: AtomicU32,
}

impl MemoryStore {
  pub fn with_knowledge(advice: Vec<Advice>) -> Self {
    Self { knowledge: Mutex::new(advice), ..Default::default() }
  }

  pub fn records(&self) -> Vec<MatchRecord> {
    self.history.lock().unwrap().clone()
  }

  pub fn fetches(&self) -> u32 {
    self.fetch_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl KnowledgeStore for MemoryStore {
  fn is_configured(&self) -> bool {
    !self.unconfigured
  }

  async fn fetch_knowledge_base(&self) -> Result<Vec<Advice>, StoreError> {
    self.fetch_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(StoreError::Transport { message: "connection refused".to_string() });
    }
    Ok(self.knowledge.lock().unwrap().clone())
  }

  async fn append_advice(&self, advice: &[Advice]) -> Result<(), StoreError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StoreError::Http { status: 503, message: "backend unavailable".to_string() });
    }
    self.knowledge.lock().unwrap().extend_from_slice(advice);
    Ok(())
  }

  async fn fetch_match_history(&self) -> Result<Vec<MatchRecord>, StoreError> {
    if self.fail_reads.load(Ordering::SeqCst) {
      return Err(StoreError::Transport { message: "connection refused".to_string() });
    }
    Ok(self.history.lock().unwrap().clone())
  }

  async fn append_match_record(&self, record: &MatchRecord) -> Result<(), StoreError> {
    if self.fail_writes.load(Ordering::SeqCst) {
      return Err(StoreError::Http { status: 503, message: "backend unavailable".to_string() });
    }
    self.history.lock().unwrap().push(record.clone());
    Ok(())
  }
}

pub fn advice(content: &str, roles: &str, subjects: &str) -> Advice {
  Advice {
    timestamp: "2024-01-01T00:00:00.000Z".to_string(),
    source_title: "Coaching VOD".to_string(),
    source_reference: "https://youtu.be/vod".to_string(),
    content: content.to_string(),
    role_tags: roles.to_string(),
    subject_tags: subjects.to_string(),
    category: Category::Macro,
    importance: Importance::Medium,
  }
}

pub fn record(result: GameResult, rate: f64) -> MatchRecord {
  MatchRecord {
    timestamp: "2024-01-01T00:00:00.000Z".to_string(),
    role: "Mid".to_string(),
    subject: "Ahri".to_string(),
    result,
    achievement_rate: rate,
    checked_count: 0,
    total_count: 0,
    note: String::new(),
  }
}
