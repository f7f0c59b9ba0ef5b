//! Video analysis: extraction, normalization and the pending batch
//!
//! Extracted advice is never written straight to the knowledge base. It is
//! parked in `pending.json` until the user accepts it, so a failed append can be
//! retried without calling the model again.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::advice::{Advice, Source};
use crate::extraction::{ExtractionError, ExtractionRequest, ExtractionService};
use crate::record::iso_timestamp;
use crate::state::{self, StateLock};
use crate::store::{KnowledgeStore, StoreError};
use crate::Result;

pub const PENDING_FILE: &str = "pending.json";
pub const PENDING_LOCK: &str = "pending.lock";

/// Advice extracted from one video, awaiting acceptance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBatch {
  pub source: Source,
  pub items: Vec<Advice>,
}

impl PendingBatch {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

pub fn default_title(now: DateTime<Local>) -> String {
  format!("Video Analysis - {}", now.format("%H:%M:%S"))
}

/// Run extraction and normalize every item against the source.
///
/// All items in the batch share one timestamp.
pub async fn analyze(
  extractor: &dyn ExtractionService,
  request: &ExtractionRequest,
  title: Option<&str>,
  now: DateTime<Utc>,
) -> std::result::Result<PendingBatch, ExtractionError> {
  let raw = extractor.extract(request).await?;

  let source = Source {
    title: title
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| default_title(now.with_timezone(&Local))),
    reference: request.video_url.trim().to_string(),
  };
  let timestamp = iso_timestamp(now);
  let items = raw.into_iter().map(|item| item.normalize(&source, &timestamp)).collect();

  Ok(PendingBatch { source, items })
}

/// Append the whole batch to the knowledge base in one request
pub async fn accept(
  store: &dyn KnowledgeStore,
  batch: &PendingBatch,
) -> std::result::Result<usize, StoreError> {
  store.append_advice(&batch.items).await?;
  tracing::info!(items = batch.items.len(), title = %batch.source.title, "advice appended");
  Ok(batch.items.len())
}

/// `pending.json` under the mindset directory
pub struct PendingStore {
  dir: PathBuf,
}

impl PendingStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn file(&self) -> PathBuf {
    self.dir.join(PENDING_FILE)
  }

  /// Exclusive hold on the pending batch for one command
  pub fn lock(&self) -> Result<StateLock> {
    StateLock::acquire(self.dir.join(PENDING_LOCK))
  }

  pub fn load(&self) -> Result<Option<PendingBatch>> {
    state::read_json(&self.file())
  }

  pub fn save(&self, batch: &PendingBatch) -> Result<()> {
    state::write_json(&self.file(), batch)
  }

  pub fn clear(&self) -> Result<()> {
    state::remove(&self.file())
  }

  /// Append the pending batch and clear it under the pending lock.
  /// `None` when nothing is waiting.
  pub async fn commit(&self, store: &dyn KnowledgeStore) -> Result<Option<(PendingBatch, usize)>> {
    let _lock = self.lock()?;
    let Some(batch) = self.load()? else {
      return Ok(None);
    };

    let added = accept(store, &batch).await?;
    self.clear()?;
    Ok(Some((batch, added)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::advice::{Category, Importance, RawAdvice};
  use crate::extraction::MockExtractionService;
  use crate::store::MockKnowledgeStore;
  use chrono::TimeZone;
  use tempfile::TempDir;

  fn request() -> ExtractionRequest {
    ExtractionRequest { video_url: " https://youtu.be/abc ".to_string(), notes: String::new() }
  }

  #[tokio::test]
  async fn test_analyze_normalizes_batch() {
    let mut extractor = MockExtractionService::new();
    extractor.expect_extract().times(1).returning(|_| {
      Ok(vec![
        RawAdvice { content: Some("Shove before roaming".to_string()), ..Default::default() },
        RawAdvice {
          content: Some("Ward the raptors".to_string()),
          role_tags: Some("Jungle".to_string()),
          category: Some("Vision".to_string()),
          importance: Some("High".to_string()),
          ..Default::default()
        },
      ])
    });

    let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 0).unwrap();
    let batch = analyze(&extractor, &request(), Some("Coaching VOD"), now).await.unwrap();

    assert_eq!(batch.source.reference, "https://youtu.be/abc");
    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.items[0].role_tags, "General");
    assert_eq!(batch.items[0].category, Category::Macro);
    assert_eq!(batch.items[1].importance, Importance::High);
    assert!(batch.items.iter().all(|a| a.timestamp == "2024-03-02T08:30:00.000Z"));
    assert!(batch.items.iter().all(|a| a.source_title == "Coaching VOD"));
  }

  #[tokio::test]
  async fn test_analyze_default_title() {
    let mut extractor = MockExtractionService::new();
    extractor.expect_extract().returning(|_| Ok(Vec::new()));

    let batch = analyze(&extractor, &request(), Some("  "), Utc::now()).await.unwrap();
    assert!(batch.source.title.starts_with("Video Analysis - "));
    assert!(batch.is_empty());
  }

  #[tokio::test]
  async fn test_analyze_failure_passes_through() {
    let mut extractor = MockExtractionService::new();
    extractor
      .expect_extract()
      .returning(|_| Err(ExtractionError::QuotaExceeded { message: "429".to_string() }));

    let err = analyze(&extractor, &request(), None, Utc::now()).await.unwrap_err();
    assert!(matches!(err, ExtractionError::QuotaExceeded { .. }));
  }

  #[test]
  fn test_pending_store_lifecycle() {
    let dir = TempDir::new().unwrap();
    let pending = PendingStore::new(dir.path());
    assert_eq!(pending.load().unwrap(), None);

    let batch = PendingBatch {
      source: Source { title: "t".to_string(), reference: "r".to_string() },
      items: Vec::new(),
    };
    pending.save(&batch).unwrap();
    assert_eq!(pending.load().unwrap(), Some(batch));

    pending.clear().unwrap();
    assert_eq!(pending.load().unwrap(), None);
  }

  #[tokio::test]
  async fn test_commit_appends_once() {
    let dir = TempDir::new().unwrap();
    let pending = PendingStore::new(dir.path());
    let source = Source { title: "VOD".to_string(), reference: "https://youtu.be/x".to_string() };
    let item = RawAdvice { content: Some("Ward".to_string()), ..Default::default() }.normalize(&source, "t");
    pending.save(&PendingBatch { source, items: vec![item] }).unwrap();

    let mut store = MockKnowledgeStore::new();
    store.expect_append_advice().times(1).returning(|_| Ok(()));

    let held = pending.lock().unwrap();
    assert!(matches!(pending.commit(&store).await, Err(crate::MindsetError::Busy { .. })));
    drop(held);

    let (batch, added) = pending.commit(&store).await.unwrap().unwrap();
    assert_eq!((batch.source.title.as_str(), added), ("VOD", 1));
    assert!(pending.commit(&store).await.unwrap().is_none());
  }
}
