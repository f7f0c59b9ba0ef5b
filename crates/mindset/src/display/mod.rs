use colored::Colorize;

use crate::advice::{Advice, Importance};
use crate::record::{display_date, GameResult};
use crate::session::{Checklist, MatchSession};
use crate::stats::{Summary, TREND_WINDOW};

pub const WIDTH: usize = 80;
const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn print_lines(lines: &[String]) {
  for line in lines {
    println!("{line}");
  }
}

/// One decimal and a percent sign
pub fn format_rate(rate: f64) -> String {
  format!("{rate:.1}%")
}

pub fn colored_result(result: GameResult) -> String {
  match result {
    GameResult::Win => result.as_str().green().bold().to_string(),
    GameResult::Loss => result.as_str().red().bold().to_string(),
  }
}

fn colored_importance(importance: Importance) -> String {
  match importance {
    Importance::High => importance.as_str().red().to_string(),
    Importance::Medium => importance.as_str().yellow().to_string(),
    Importance::Low => importance.as_str().dimmed().to_string(),
  }
}

/// Greedy word wrap; words longer than the width get a line of their own
pub fn wrap(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  for paragraph in text.lines() {
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
      if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
        lines.push(std::mem::take(&mut current));
      }
      if !current.is_empty() {
        current.push(' ');
      }
      current.push_str(word);
    }
    lines.push(current);
  }
  if lines.is_empty() {
    lines.push(String::new());
  }
  lines
}

fn tag_line(advice: &Advice) -> String {
  format!(
    "{} | {} | {} / {}",
    colored_importance(advice.importance),
    advice.category,
    advice.roles().join(", "),
    advice.subjects().join(", ")
  )
}

/// Numbered advice entries, content wrapped under a tag line
pub fn advice_lines(items: &[Advice]) -> Vec<String> {
  let mut lines = Vec::new();
  for (i, advice) in items.iter().enumerate() {
    let number = format!("{:>3}.", i + 1);
    lines.push(format!("{} {}", number.bold(), tag_line(advice)));
    for line in wrap(&advice.content, WIDTH - 5) {
      lines.push(format!("     {line}"));
    }
  }
  lines
}

pub fn checklist_lines(checklist: &Checklist) -> Vec<String> {
  if checklist.items.is_empty() {
    return vec![
      "No advice in the knowledge base applies to this match.".dimmed().to_string(),
      "You can still save it; it will be recorded with 0 of 0 items.".dimmed().to_string(),
    ];
  }

  let mut lines = Vec::new();
  for (i, advice) in checklist.items.iter().enumerate() {
    let mark = if checklist.is_checked(i) { "[x]".green().to_string() } else { "[ ]".to_string() };
    let mut wrapped = wrap(&advice.content, WIDTH - 10).into_iter();
    let first = wrapped.next().unwrap_or_default();
    lines.push(format!("{mark} {:>3}. {first}", i + 1));
    for rest in wrapped {
      lines.push(format!("          {rest}"));
    }
    lines.push(format!("          {}", tag_line(advice).dimmed()));
  }
  lines
}

pub fn session_lines(session: &MatchSession) -> Vec<String> {
  let setup = &session.setup;
  let subject = if setup.subject.is_empty() { "(no champion)" } else { setup.subject.as_str() };
  let mut lines = vec![format!(
    "Match: {} {} | {}",
    setup.role.to_string().bold(),
    subject.bold(),
    colored_result(setup.result)
  )];

  match session.checklist() {
    None => lines.push("Not started. Run `mindset review start` to load the checklist.".to_string()),
    Some(checklist) => {
      lines.push(String::new());
      lines.extend(checklist_lines(checklist));
      lines.push(String::new());
      lines.push(format!(
        "Followed {} of {} ({})",
        checklist.checked_count(),
        checklist.total(),
        format_rate(checklist.achievement_rate())
      ));
      if !checklist.note.is_empty() {
        lines.push(format!("Note: {}", checklist.note));
      }
    }
  }
  lines
}

/// One bar per value on a 0-100 scale
pub fn sparkline(values: &[f64]) -> String {
  values
    .iter()
    .map(|v| {
      let clamped = if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
      let slot = ((clamped / 100.0) * (SPARKS.len() - 1) as f64).round() as usize;
      SPARKS[slot.min(SPARKS.len() - 1)]
    })
    .collect()
}

pub fn dashboard_lines(summary: &Summary) -> Vec<String> {
  let mut lines = vec![
    format!(
      "Games: {}   Win rate: {}   Avg adherence: {}",
      summary.total_games.to_string().bold(),
      format_rate(summary.overall_win_rate).bold(),
      format_rate(summary.average_adherence).bold()
    ),
    String::new(),
    "Win rate by adherence".underline().to_string(),
  ];

  for band in &summary.adherence_bands {
    lines.push(format!(
      "  {:<8} {:>4} game(s)   win rate {:>6}",
      band.label,
      band.games,
      format_rate(band.win_rate)
    ));
  }

  lines.push(String::new());
  lines.push(format!("Adherence trend (last {TREND_WINDOW})").underline().to_string());
  if summary.recent_trend.is_empty() {
    lines.push("  No matches recorded yet.".dimmed().to_string());
  } else {
    let rates: Vec<f64> = summary.recent_trend.iter().map(|p| p.achievement_rate).collect();
    let spark: String = sparkline(&rates)
      .chars()
      .zip(&summary.recent_trend)
      .map(|(c, p)| {
        let bar = c.to_string();
        if p.result.is_win() { bar.green().to_string() } else { bar.red().to_string() }
      })
      .collect();
    lines.push(format!("  {spark}"));
  }

  lines.push(String::new());
  lines.push("Recent matches".underline().to_string());
  if summary.recent_matches.is_empty() {
    lines.push("  No matches recorded yet.".dimmed().to_string());
  }
  for recent in &summary.recent_matches {
    lines.push(format!(
      "  {:<4}  {:<14} {:<8} {:>6}  {}",
      colored_result(recent.result),
      recent.subject,
      recent.role,
      format_rate(recent.achievement_rate),
      display_date(&recent.timestamp)
    ));
  }
  lines
}
