//! Dashboard statistics over the match history
//!
//! Everything here is recomputed from the full history on every call. Histories
//! are hundreds of rows, not millions.

use serde::Serialize;

use crate::record::{GameResult, MatchRecord};

/// How many games the trend line covers
pub const TREND_WINDOW: usize = 20;
/// How many games the recent-match table shows
pub const RECENT_WINDOW: usize = 5;

/// Adherence ranges used to correlate checklist discipline with winning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdherenceBand {
  /// [0, 25]
  Low,
  /// (25, 50]
  Fair,
  /// (50, 75]
  Good,
  /// (75, 100]
  High,
}

impl AdherenceBand {
  pub const ALL: [AdherenceBand; 4] =
    [AdherenceBand::Low, AdherenceBand::Fair, AdherenceBand::Good, AdherenceBand::High];

  /// Cascading strict `>` tests from the top band down: exactly 25, 50 and 75
  /// land in the lower band. NaN lands in `Low`.
  pub fn for_rate(rate: f64) -> Self {
    if rate > 75.0 {
      AdherenceBand::High
    } else if rate > 50.0 {
      AdherenceBand::Good
    } else if rate > 25.0 {
      AdherenceBand::Fair
    } else {
      AdherenceBand::Low
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      AdherenceBand::Low => "0-25%",
      AdherenceBand::Fair => "26-50%",
      AdherenceBand::Good => "51-75%",
      AdherenceBand::High => "76-100%",
    }
  }

  fn index(self) -> usize {
    match self {
      AdherenceBand::Low => 0,
      AdherenceBand::Fair => 1,
      AdherenceBand::Good => 2,
      AdherenceBand::High => 3,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandStats {
  pub band: AdherenceBand,
  pub label: &'static str,
  pub games: usize,
  pub wins: usize,
  pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
  /// 1-based position within the trend window
  pub game: usize,
  pub achievement_rate: f64,
  pub result: GameResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentMatch {
  pub result: GameResult,
  pub subject: String,
  pub role: String,
  pub achievement_rate: f64,
  pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
  pub total_games: usize,
  pub overall_win_rate: f64,
  pub average_adherence: f64,
  pub adherence_bands: Vec<BandStats>,
  pub recent_trend: Vec<TrendPoint>,
  pub recent_matches: Vec<RecentMatch>,
}

fn percentage(part: usize, whole: usize) -> f64 {
  if whole == 0 {
    0.0
  } else {
    100.0 * part as f64 / whole as f64
  }
}

pub fn aggregate(history: &[MatchRecord]) -> Summary {
  let total_games = history.len();
  let wins = history.iter().filter(|m| m.result.is_win()).count();

  let average_adherence = if total_games == 0 {
    0.0
  } else {
    history.iter().map(|m| m.achievement_rate).sum::<f64>() / total_games as f64
  };

  let mut tallies = [(0usize, 0usize); 4];
  for record in history {
    let slot = &mut tallies[AdherenceBand::for_rate(record.achievement_rate).index()];
    slot.0 += 1;
    if record.result.is_win() {
      slot.1 += 1;
    }
  }

  let adherence_bands = AdherenceBand::ALL
    .iter()
    .map(|&band| {
      let (games, wins) = tallies[band.index()];
      BandStats { band, label: band.label(), games, wins, win_rate: percentage(wins, games) }
    })
    .collect();

  let trend_start = total_games.saturating_sub(TREND_WINDOW);
  let recent_trend = history[trend_start..]
    .iter()
    .enumerate()
    .map(|(i, m)| TrendPoint { game: i + 1, achievement_rate: m.achievement_rate, result: m.result })
    .collect();

  let recent_matches = history
    .iter()
    .rev()
    .take(RECENT_WINDOW)
    .map(|m| RecentMatch {
      result: m.result,
      subject: m.subject.clone(),
      role: m.role.clone(),
      achievement_rate: m.achievement_rate,
      timestamp: m.timestamp.clone(),
    })
    .collect();

  Summary {
    total_games,
    overall_win_rate: percentage(wins, total_games),
    average_adherence,
    adherence_bands,
    recent_trend,
    recent_matches,
  }
}

impl Summary {
  pub fn band(&self, band: AdherenceBand) -> &BandStats {
    &self.adherence_bands[band.index()]
  }
}
