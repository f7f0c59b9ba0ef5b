//! Advice and its vocabulary
//!
//! `Advice` is the validated shape used everywhere past the extraction boundary.
//! What the model hands back is a `RawAdvice` with every field optional; the
//! only way from one to the other is [`RawAdvice::normalize`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tag value meaning "applies regardless of role/subject"
pub const GENERAL_TAG: &str = "General";

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseVocabularyError {
  kind: &'static str,
  value: String,
  expected: &'static str,
}

impl ParseVocabularyError {
  pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
    Self { kind, value: value.to_string(), expected }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
  Top,
  Jungle,
  #[default]
  Mid,
  #[serde(rename = "ADC")]
  Adc,
  Support,
}

impl Role {
  pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Adc, Role::Support];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Top => "Top",
      Role::Jungle => "Jungle",
      Role::Mid => "Mid",
      Role::Adc => "ADC",
      Role::Support => "Support",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = ParseVocabularyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Role::ALL
      .into_iter()
      .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseVocabularyError::new("role", s, "Top, Jungle, Mid, ADC, Support"))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Category {
  /// Laning and positioning
  Laning,
  /// Team coordination
  Teamfight,
  /// Map awareness
  Vision,
  /// Macro strategy
  #[default]
  Macro,
  /// Mental and tilt control
  Mental,
}

impl Category {
  pub const ALL: [Category; 5] =
    [Category::Laning, Category::Teamfight, Category::Vision, Category::Macro, Category::Mental];

  pub fn as_str(self) -> &'static str {
    match self {
      Category::Laning => "Laning",
      Category::Teamfight => "Teamfight",
      Category::Vision => "Vision",
      Category::Macro => "Macro",
      Category::Mental => "Mental",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = ParseVocabularyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Category::ALL.into_iter().find(|c| c.as_str().eq_ignore_ascii_case(s.trim())).ok_or_else(|| {
      ParseVocabularyError::new("category", s, "Laning, Teamfight, Vision, Macro, Mental")
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Importance {
  High,
  #[default]
  Medium,
  Low,
}

impl Importance {
  pub const ALL: [Importance; 3] = [Importance::High, Importance::Medium, Importance::Low];

  pub fn as_str(self) -> &'static str {
    match self {
      Importance::High => "High",
      Importance::Medium => "Medium",
      Importance::Low => "Low",
    }
  }
}

impl fmt::Display for Importance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Importance {
  type Err = ParseVocabularyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Importance::ALL
      .into_iter()
      .find(|i| i.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseVocabularyError::new("importance", s, "High, Medium, Low"))
  }
}

/// One stored piece of coaching guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
  pub timestamp: String,
  pub source_title: String,
  pub source_reference: String,
  pub content: String,
  /// Comma-joined roles, or "General"
  pub role_tags: String,
  /// Comma-joined champions, or "General"
  pub subject_tags: String,
  pub category: Category,
  pub importance: Importance,
}

impl Advice {
  pub fn roles(&self) -> Vec<&str> {
    split_tags(&self.role_tags)
  }

  pub fn subjects(&self) -> Vec<&str> {
    split_tags(&self.subject_tags)
  }
}

/// Split a comma-joined tag string for display
pub fn split_tags(tags: &str) -> Vec<&str> {
  tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
}

/// Where a batch of extracted advice came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub title: String,
  pub reference: String,
}

/// An advice item as the extraction model returned it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAdvice {
  #[serde(default, deserialize_with = "text_or_list")]
  pub content: Option<String>,
  #[serde(default, deserialize_with = "text_or_list")]
  pub role_tags: Option<String>,
  #[serde(default, alias = "champion_tags", deserialize_with = "text_or_list")]
  pub subject_tags: Option<String>,
  #[serde(default, deserialize_with = "text_or_list")]
  pub category: Option<String>,
  #[serde(default, deserialize_with = "text_or_list")]
  pub importance: Option<String>,
}

impl RawAdvice {
  /// Fill the defaults for everything the model left out.
  ///
  /// Blank strings count as missing. A category or importance outside the fixed
  /// vocabulary falls back to its default as well.
  pub fn normalize(self, source: &Source, timestamp: &str) -> Advice {
    let category = present(self.category)
      .and_then(|c| {
        c.parse::<Category>()
          .map_err(|e| tracing::warn!("extracted advice has {e}; using {}", Category::default()))
          .ok()
      })
      .unwrap_or_default();

    let importance = present(self.importance)
      .and_then(|i| {
        i.parse::<Importance>()
          .map_err(|e| tracing::warn!("extracted advice has {e}; using {}", Importance::default()))
          .ok()
      })
      .unwrap_or_default();

    Advice {
      timestamp: timestamp.to_string(),
      source_title: source.title.clone(),
      source_reference: source.reference.clone(),
      content: present(self.content).unwrap_or_default(),
      role_tags: present(self.role_tags).unwrap_or_else(|| GENERAL_TAG.to_string()),
      subject_tags: present(self.subject_tags).unwrap_or_else(|| GENERAL_TAG.to_string()),
      category,
      importance,
    }
  }
}

fn present(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Models sometimes answer `["Top", "Mid"]` where a string was asked for
fn text_or_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum TextOrList {
    Text(String),
    List(Vec<String>),
    Other(serde_json::Value),
  }

  Ok(match Option::<TextOrList>::deserialize(deserializer)? {
    None => None,
    Some(TextOrList::Text(s)) => Some(s),
    Some(TextOrList::List(items)) => Some(items.join(", ")),
    Some(TextOrList::Other(serde_json::Value::Null)) => None,
    Some(TextOrList::Other(v)) => Some(v.to_string()),
  })
}
