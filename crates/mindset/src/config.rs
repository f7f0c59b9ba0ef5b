//! Persisted local configuration
//!
//! Everything lives under one directory: `$MINDSET_DIR` when set, `~/.mindset`
//! otherwise. `config.json` holds the settings below and is written owner-only
//! because it carries the extraction key.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::extraction::gemini::DEFAULT_MODEL;

pub const DIR_ENV: &str = "MINDSET_DIR";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
  #[error("No {field} is configured")]
  Missing { field: &'static str, flag: &'static str },
}

impl ConfigError {
  pub fn remediation(&self) -> String {
    match self {
      ConfigError::Missing { flag, .. } => {
        format!("Set it with `mindset config set --{flag} <VALUE>`.")
      }
    }
  }
}

fn default_model() -> String {
  DEFAULT_MODEL.to_string()
}

fn default_language() -> String {
  "Japanese".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
  /// Google spreadsheet holding the two tabs
  #[serde(default)]
  pub spreadsheet_id: String,
  /// OAuth client id of a Google "desktop app" client
  #[serde(default)]
  pub client_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_secret: Option<String>,
  #[serde(default)]
  pub gemini_api_key: String,
  #[serde(default = "default_model")]
  pub gemini_model: String,
  /// Language the extracted advice is written in
  #[serde(default = "default_language")]
  pub advice_language: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      spreadsheet_id: String::new(),
      client_id: String::new(),
      client_secret: None,
      gemini_api_key: String::new(),
      gemini_model: default_model(),
      advice_language: default_language(),
    }
  }
}

/// Values supplied for a single invocation, from flags or the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
  pub spreadsheet_id: Option<String>,
  pub client_id: Option<String>,
  pub gemini_api_key: Option<String>,
}

/// Changes requested through `mindset config set`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigUpdate {
  pub spreadsheet_id: Option<String>,
  pub client_id: Option<String>,
  pub client_secret: Option<String>,
  pub gemini_api_key: Option<String>,
  pub gemini_model: Option<String>,
  pub advice_language: Option<String>,
}

impl ConfigUpdate {
  pub fn is_empty(&self) -> bool {
    *self == ConfigUpdate::default()
  }
}

/// The mindset directory, honouring `$MINDSET_DIR`
pub fn mindset_dir() -> PathBuf {
  match std::env::var(DIR_ENV) {
    Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
    _ => dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".mindset"),
  }
}

/// Write a file readable by its owner only
pub(crate) fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  fs::write(path, content)?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
  }

  Ok(())
}

impl AppConfig {
  pub fn path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
  }

  /// Load from `dir`, falling back to defaults when nothing was saved yet
  pub fn load(dir: &Path) -> crate::Result<Self> {
    let path = Self::path(dir);
    if !path.exists() {
      tracing::debug!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }
    let content = fs::read_to_string(&path)?;
    let config = serde_json::from_str(content.trim())?;
    Ok(config)
  }

  pub fn save(&self, dir: &Path) -> crate::Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    write_private(&Self::path(dir), &content)?;
    Ok(())
  }

  /// Layer per-invocation values over the saved ones
  pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
    let pick = |current: &mut String, value: &Option<String>| {
      if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *current = v.to_string();
      }
    };
    pick(&mut self.spreadsheet_id, &overrides.spreadsheet_id);
    pick(&mut self.client_id, &overrides.client_id);
    pick(&mut self.gemini_api_key, &overrides.gemini_api_key);
    self
  }

  /// Apply an update; returns true when the client identity changed.
  pub fn apply(&mut self, update: ConfigUpdate) -> bool {
    let old_client = self.client_id.clone();

    if let Some(v) = update.spreadsheet_id {
      self.spreadsheet_id = v.trim().to_string();
    }
    if let Some(v) = update.client_id {
      self.client_id = v.trim().to_string();
    }
    if let Some(v) = update.client_secret {
      let v = v.trim().to_string();
      self.client_secret = if v.is_empty() { None } else { Some(v) };
    }
    if let Some(v) = update.gemini_api_key {
      self.gemini_api_key = v.trim().to_string();
    }
    if let Some(v) = update.gemini_model.filter(|v| !v.trim().is_empty()) {
      self.gemini_model = v.trim().to_string();
    }
    if let Some(v) = update.advice_language.filter(|v| !v.trim().is_empty()) {
      self.advice_language = v.trim().to_string();
    }

    old_client != self.client_id
  }

  pub fn require_spreadsheet(&self) -> Result<&str, ConfigError> {
    require(&self.spreadsheet_id, "spreadsheet id", "spreadsheet-id")
  }

  pub fn require_client_id(&self) -> Result<&str, ConfigError> {
    require(&self.client_id, "OAuth client id", "client-id")
  }

  pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
    require(&self.gemini_api_key, "Gemini API key", "gemini-key")
  }

  /// `(name, value)` pairs for display, with secrets masked
  pub fn display_entries(&self) -> Vec<(&'static str, String)> {
    vec![
      ("spreadsheet_id", shown(&self.spreadsheet_id)),
      ("client_id", shown(&self.client_id)),
      ("client_secret", mask(self.client_secret.as_deref().unwrap_or(""))),
      ("gemini_api_key", mask(&self.gemini_api_key)),
      ("gemini_model", shown(&self.gemini_model)),
      ("advice_language", shown(&self.advice_language)),
    ]
  }
}

fn require<'a>(
  value: &'a str,
  field: &'static str,
  flag: &'static str,
) -> Result<&'a str, ConfigError> {
  let value = value.trim();
  if value.is_empty() {
    Err(ConfigError::Missing { field, flag })
  } else {
    Ok(value)
  }
}

fn shown(value: &str) -> String {
  if value.is_empty() {
    "(not set)".to_string()
  } else {
    value.to_string()
  }
}

/// Keep only the last four characters of a secret visible
pub fn mask(secret: &str) -> String {
  let chars: Vec<char> = secret.chars().collect();
  match chars.len() {
    0 => "(not set)".to_string(),
    n if n <= 8 => "********".to_string(),
    n => format!("********{}", chars[n - 4..].iter().collect::<String>()),
  }
}
