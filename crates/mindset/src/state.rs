//! Local state files under the mindset directory
//!
//! Session and pending-advice files are replaced atomically, and any command
//! that sends them to the spreadsheet holds an exclusive lock file until the
//! local copy is cleared. A second process sees the lock and refuses instead of
//! appending the same rows again.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{MindsetError, Result};

/// Exclusive hold on one state file. Released on drop.
#[derive(Debug)]
pub struct StateLock {
  path: PathBuf,
}

impl StateLock {
  /// Create `path` or fail with `Busy` if another command already holds it
  pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
    let path = path.into();
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }

    match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
      Ok(mut file) => {
        let _ = writeln!(file, "{}", std::process::id());
        tracing::debug!(lock = %path.display(), "state lock acquired");
        Ok(Self { path })
      }
      Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(MindsetError::Busy { path }),
      Err(e) => Err(e.into()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for StateLock {
  fn drop(&mut self) {
    if let Err(e) = fs::remove_file(&self.path) {
      tracing::warn!(lock = %self.path.display(), "could not release state lock: {e}");
    }
  }
}

/// Write through a temp file in the same directory, then rename over `path`
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
  let parent = path.parent().unwrap_or_else(|| Path::new("."));
  fs::create_dir_all(parent)?;

  let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("state");
  let tmp = parent.join(format!(".{name}.{}.tmp", std::process::id()));
  {
    let mut file = fs::File::create(&tmp)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
  }
  fs::rename(&tmp, path)?;
  Ok(())
}

/// Read a JSON state file; `None` when it does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
  let json = match fs::read_to_string(path) {
    Ok(json) => json,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(e.into()),
  };
  serde_json::from_str(&json)
    .map(Some)
    .map_err(|e| MindsetError::CorruptState { path: path.to_path_buf(), message: e.to_string() })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
  write_atomic(path, &serde_json::to_string_pretty(value)?)
}

pub fn remove(path: &Path) -> Result<()> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_second_lock_is_refused_until_release() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.lock");

    let held = StateLock::acquire(&path).unwrap();
    let err = StateLock::acquire(&path).unwrap_err();
    assert!(matches!(err, MindsetError::Busy { .. }));
    assert!(err.remediation().contains("session.lock"));

    drop(held);
    assert!(!path.exists());
    assert!(StateLock::acquire(&path).is_ok());
  }

  #[test]
  fn test_atomic_write_leaves_no_temp_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");

    write_atomic(&path, "{\"a\":1}").unwrap();
    write_atomic(&path, "{\"a\":2}").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{\"a\":2}");
    let names: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().map(|e| e.unwrap().file_name()).collect();
    assert_eq!(names.len(), 1);
  }

  #[test]
  fn test_truncated_file_names_itself() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{\"setup\": {\"role\"").unwrap();

    let err = read_json::<serde_json::Value>(&path).unwrap_err();
    assert!(matches!(err, MindsetError::CorruptState { .. }));
    assert!(err.remediation().contains("session.json"));
  }

  #[test]
  fn test_missing_file_reads_none() {
    let dir = TempDir::new().unwrap();
    assert_eq!(read_json::<serde_json::Value>(&dir.path().join("nope.json")).unwrap(), None);
    remove(&dir.path().join("nope.json")).unwrap();
  }
}
