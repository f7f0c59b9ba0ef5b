mod common;

use common::record;
use mindset::record::GameResult::{Loss, Win};
use mindset::stats::{aggregate, AdherenceBand, RECENT_WINDOW, TREND_WINDOW};

fn close(a: f64, b: f64) -> bool {
  (a - b).abs() < 0.05
}

#[test]
fn test_empty_history() {
  let summary = aggregate(&[]);

  assert_eq!(summary.total_games, 0);
  assert_eq!(summary.overall_win_rate, 0.0);
  assert_eq!(summary.average_adherence, 0.0);
  assert_eq!(summary.adherence_bands.len(), 4);
  assert!(summary.adherence_bands.iter().all(|b| b.games == 0 && b.win_rate == 0.0));
  assert!(summary.recent_trend.is_empty());
  assert!(summary.recent_matches.is_empty());
}

#[test]
fn test_three_game_history() {
  let history = vec![record(Win, 80.0), record(Loss, 30.0), record(Win, 90.0)];
  let summary = aggregate(&history);

  assert_eq!(summary.total_games, 3);
  assert!(close(summary.overall_win_rate, 66.7));
  assert!(close(summary.average_adherence, 66.7));

  let high = summary.band(AdherenceBand::High);
  assert_eq!((high.games, high.win_rate), (2, 100.0));
  let fair = summary.band(AdherenceBand::Fair);
  assert_eq!((fair.games, fair.win_rate), (1, 0.0));
  assert_eq!(summary.band(AdherenceBand::Good).games, 0);
  assert_eq!(summary.band(AdherenceBand::Low).games, 0);
}

#[test]
fn test_boundary_rates() {
  let summary = aggregate(&[record(Win, 75.0), record(Loss, 75.1)]);

  assert_eq!(summary.band(AdherenceBand::Good).games, 1);
  assert_eq!(summary.band(AdherenceBand::Good).win_rate, 100.0);
  assert_eq!(summary.band(AdherenceBand::High).games, 1);
  assert_eq!(summary.band(AdherenceBand::High).win_rate, 0.0);
}

#[test]
fn test_band_labels_in_order() {
  let labels: Vec<&str> = aggregate(&[]).adherence_bands.iter().map(|b| b.label).collect();
  assert_eq!(labels, vec!["0-25%", "26-50%", "51-75%", "76-100%"]);
}

#[test]
fn test_trend_keeps_last_window_in_order() {
  let history: Vec<_> = (0..25).map(|i| record(if i % 2 == 0 { Win } else { Loss }, i as f64)).collect();
  let summary = aggregate(&history);

  assert_eq!(summary.recent_trend.len(), TREND_WINDOW);
  assert_eq!(summary.recent_trend[0].game, 1);
  assert_eq!(summary.recent_trend[0].achievement_rate, 5.0);
  assert_eq!(summary.recent_trend[TREND_WINDOW - 1].game, TREND_WINDOW);
  assert_eq!(summary.recent_trend[TREND_WINDOW - 1].achievement_rate, 24.0);
}

#[test]
fn test_recent_matches_newest_first() {
  let history: Vec<_> = (0..8).map(|i| record(Win, 10.0 * i as f64)).collect();
  let summary = aggregate(&history);

  let rates: Vec<f64> = summary.recent_matches.iter().map(|m| m.achievement_rate).collect();
  assert_eq!(rates.len(), RECENT_WINDOW);
  assert_eq!(rates, vec![70.0, 60.0, 50.0, 40.0, 30.0]);
}

#[test]
fn test_short_history_trend() {
  let summary = aggregate(&[record(Loss, 10.0), record(Win, 20.0)]);
  let games: Vec<usize> = summary.recent_trend.iter().map(|p| p.game).collect();
  assert_eq!(games, vec![1, 2]);
  assert_eq!(summary.recent_matches[0].achievement_rate, 20.0);
}

#[test]
fn test_summary_json_shape() {
  let json = serde_json::to_value(aggregate(&[record(Win, 80.0)])).unwrap();
  assert_eq!(json["total_games"], 1);
  assert_eq!(json["adherence_bands"][3]["label"], "76-100%");
  assert_eq!(json["recent_trend"][0]["result"], "Win");
}
