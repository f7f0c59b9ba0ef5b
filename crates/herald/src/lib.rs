//! Herald - the console voice of the mindset tools
//!
//! Every user-facing status line goes through here so the CLI speaks with one
//! voice: a short colored tag, a fixed-width gutter, and the message. All output
//! goes to stderr so stdout stays clean for data (`--json` and friends).
//!
//! ## Usage
//!
//! Status lines: `info()`, `warn()`, `error()`, `success()`, `debug()`
//!
//! Banners: `announce()` for section headers, `spotlight()` for things the user
//! must not miss.
//!
//! Each function has a `format!`-style macro twin (`herald::info!("{} games", n)`).

use colored::{Color, Colorize};
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

const GUTTER: usize = 7;

/// Show or hide `debug` lines. Hidden by default.
pub fn set_verbose(verbose: bool) {
  VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
  VERBOSE.load(Ordering::Relaxed)
}

/// The kinds of status line herald knows how to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Info,
  Warn,
  Error,
  Success,
  Debug,
}

impl Tone {
  fn tag(self) -> &'static str {
    match self {
      Tone::Info => "info",
      Tone::Warn => "warn",
      Tone::Error => "error",
      Tone::Success => "done",
      Tone::Debug => "debug",
    }
  }

  fn color(self) -> Color {
    match self {
      Tone::Info => Color::Blue,
      Tone::Warn => Color::Yellow,
      Tone::Error => Color::Red,
      Tone::Success => Color::Green,
      Tone::Debug => Color::Magenta,
    }
  }
}

/// Render a message as prefixed lines without printing it.
///
/// Multi-line messages get the prefix on every line so grepping a log never
/// loses context.
pub fn render(tone: Tone, message: &str) -> Vec<String> {
  let tag = tone.tag();
  let pad = GUTTER.saturating_sub(tag.len() + 2);
  let prefix = format!("[{}]{:pad$}", tag.color(tone.color()).bold(), "", pad = pad);

  message.lines().map(|line| format!("{prefix} {line}")).collect()
}

fn emit(lines: &[String]) {
  for line in lines {
    eprintln!("{line}");
  }
}

fn say(tone: Tone, message: &str) {
  if tone == Tone::Debug && !is_verbose() {
    return;
  }
  emit(&render(tone, message));
}

pub fn info(message: &str) {
  say(Tone::Info, message);
}

/// Something needs the user's attention but the action went ahead
pub fn warn(message: &str) {
  say(Tone::Warn, message);
}

/// The action failed
pub fn error(message: &str) {
  say(Tone::Error, message);
}

pub fn success(message: &str) {
  say(Tone::Success, message);
}

/// Only printed after `set_verbose(true)`
pub fn debug(message: &str) {
  say(Tone::Debug, message);
}

/// A horizontal rule
pub fn rule(width: usize, ch: char) -> String {
  ch.to_string().repeat(width)
}

/// Frame a message between two rules
pub fn banner(message: &str, width: usize, ch: char) -> Vec<String> {
  let edge = rule(width, ch);
  let mut lines = Vec::with_capacity(message.lines().count() + 2);
  lines.push(edge.clone());
  lines.extend(message.lines().map(str::to_string));
  lines.push(edge);
  lines
}

/// Section header
pub fn announce(message: &str) {
  let lines: Vec<String> =
    banner(message, 50, '-').into_iter().map(|l| l.cyan().bold().to_string()).collect();
  emit(&lines);
}

/// Important, easy-to-miss information
pub fn spotlight(message: &str) {
  let lines: Vec<String> =
    banner(message, 40, '*').into_iter().map(|l| l.yellow().bold().to_string()).collect();
  emit(&lines);
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => {
    $crate::debug(&format!($($arg)*))
  };
}
