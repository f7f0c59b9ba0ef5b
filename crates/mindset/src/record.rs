//! Match records and the adherence score

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::advice::{ParseVocabularyError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameResult {
  #[default]
  Win,
  Loss,
}

impl GameResult {
  pub fn as_str(self) -> &'static str {
    match self {
      GameResult::Win => "Win",
      GameResult::Loss => "Loss",
    }
  }

  pub fn is_win(self) -> bool {
    self == GameResult::Win
  }

  /// Anything that is not "win" counts as a loss, matching how existing sheets are read
  pub fn from_cell(cell: &str) -> Self {
    if cell.trim().eq_ignore_ascii_case("win") {
      GameResult::Win
    } else {
      GameResult::Loss
    }
  }
}

impl fmt::Display for GameResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for GameResult {
  type Err = ParseVocabularyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "win" | "w" => Ok(GameResult::Win),
      "loss" | "lose" | "l" => Ok(GameResult::Loss),
      _ => Err(ParseVocabularyError::new("result", s, "Win, Loss")),
    }
  }
}

/// One completed match review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub timestamp: String,
  /// Free text on read: sheets may hold roles this tool never wrote
  pub role: String,
  pub subject: String,
  pub result: GameResult,
  pub achievement_rate: f64,
  pub checked_count: usize,
  pub total_count: usize,
  pub note: String,
}

impl MatchRecord {
  /// Build the record for a finished checklist. The rate is always derived
  /// from the two counts here, never supplied by the caller.
  pub fn completed(
    at: DateTime<Utc>,
    role: Role,
    subject: &str,
    result: GameResult,
    checked_count: usize,
    total_count: usize,
    note: &str,
  ) -> Self {
    Self {
      timestamp: iso_timestamp(at),
      role: role.to_string(),
      subject: subject.to_string(),
      result,
      achievement_rate: achievement_rate(checked_count, total_count),
      checked_count,
      total_count,
      note: note.to_string(),
    }
  }
}

/// Percentage of checklist items followed, rounded to one decimal. Zero for an
/// empty checklist.
pub fn achievement_rate(checked: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  let rate = 100.0 * checked as f64 / total as f64;
  (rate * 10.0).round() / 10.0
}

/// UTC, millisecond precision, `Z` suffix
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Best-effort short date for display; sheets may have reformatted the cell
pub fn display_date(timestamp: &str) -> String {
  DateTime::parse_from_rfc3339(timestamp)
    .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
    .unwrap_or_else(|_| timestamp.to_string())
}
