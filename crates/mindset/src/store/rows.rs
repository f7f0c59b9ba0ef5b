//! Positional row layout of the two sheet tabs
//!
//! Columns are addressed by position, not header name. Row 1 of each tab is a
//! header and is never read.
//!
//! | col | Knowledge_Base   | Match_History    |
//! |-----|------------------|------------------|
//! | A   | timestamp        | timestamp        |
//! | B   | source_title     | role             |
//! | C   | source_reference | subject          |
//! | D   | content          | result           |
//! | E   | role_tags        | achievement_rate |
//! | F   | subject_tags     | checked_count    |
//! | G   | category         | total_count      |
//! | H   | importance       | note             |

use serde_json::Value;

use crate::advice::{Advice, Category, Importance};
use crate::record::{GameResult, MatchRecord};

pub const KNOWLEDGE_TAB: &str = "Knowledge_Base";
pub const HISTORY_TAB: &str = "Match_History";

/// Data rows only, skipping the header
pub fn read_range(tab: &str) -> String {
  format!("{tab}!A2:H")
}

/// Append anchor; the service finds the end of the table itself
pub fn append_range(tab: &str) -> String {
  format!("{tab}!A1")
}

/// Cell text. Missing trailing cells come back as absent, not empty.
fn cell(row: &[Value], index: usize) -> String {
  match row.get(index) {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.clone(),
    Some(other) => other.to_string(),
  }
}

pub fn is_blank(row: &[Value]) -> bool {
  (0..row.len()).all(|i| cell(row, i).trim().is_empty())
}

pub fn advice_to_row(advice: &Advice) -> Vec<Value> {
  vec![
    Value::from(advice.timestamp.as_str()),
    Value::from(advice.source_title.as_str()),
    Value::from(advice.source_reference.as_str()),
    Value::from(advice.content.as_str()),
    Value::from(advice.role_tags.as_str()),
    Value::from(advice.subject_tags.as_str()),
    Value::from(advice.category.as_str()),
    Value::from(advice.importance.as_str()),
  ]
}

pub fn advice_from_row(row: &[Value]) -> Advice {
  let category = cell(row, 6);
  let importance = cell(row, 7);

  Advice {
    timestamp: cell(row, 0),
    source_title: cell(row, 1),
    source_reference: cell(row, 2),
    content: cell(row, 3),
    role_tags: cell(row, 4),
    subject_tags: cell(row, 5),
    category: category.parse::<Category>().unwrap_or_else(|e| {
      tracing::warn!("knowledge base row has {e}; reading it as {}", Category::default());
      Category::default()
    }),
    importance: importance.parse::<Importance>().unwrap_or_else(|e| {
      tracing::warn!("knowledge base row has {e}; reading it as {}", Importance::default());
      Importance::default()
    }),
  }
}

pub fn record_to_row(record: &MatchRecord) -> Vec<Value> {
  vec![
    Value::from(record.timestamp.as_str()),
    Value::from(record.role.as_str()),
    Value::from(record.subject.as_str()),
    Value::from(record.result.as_str()),
    Value::from(record.achievement_rate),
    Value::from(record.checked_count),
    Value::from(record.total_count),
    Value::from(record.note.as_str()),
  ]
}

pub fn record_from_row(row: &[Value]) -> MatchRecord {
  MatchRecord {
    timestamp: cell(row, 0),
    role: cell(row, 1),
    subject: cell(row, 2),
    result: GameResult::from_cell(&cell(row, 3)),
    achievement_rate: parse_rate(&cell(row, 4)),
    checked_count: parse_count(&cell(row, 5)),
    total_count: parse_count(&cell(row, 6)),
    note: cell(row, 7),
  }
}

fn parse_rate(text: &str) -> f64 {
  let trimmed = text.trim().trim_end_matches('%').trim();
  match trimmed.parse::<f64>() {
    Ok(rate) if rate.is_finite() => rate,
    _ => {
      tracing::warn!("match history has unreadable achievement rate '{text}'; reading it as 0");
      0.0
    }
  }
}

fn parse_count(text: &str) -> usize {
  let trimmed = text.trim();
  trimmed
    .parse::<usize>()
    .ok()
    .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as usize))
    .unwrap_or_else(|| {
      tracing::warn!("match history has unreadable count '{text}'; reading it as 0");
      0
    })
}
