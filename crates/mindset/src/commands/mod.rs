//! One handler per command group
//!
//! Handlers return `anyhow::Result`; library errors pass through unchanged so
//! `remediation` can find them again for the closing hint.

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::extraction::ExtractionError;
use crate::session::SessionError;
use crate::store::StoreError;
use crate::MindsetError;

pub mod advice;
pub mod analyze;
pub mod config;
pub mod dashboard;
pub mod login;
pub mod logout;
pub mod review;

/// The fix-it hint for the first library error found in the chain
pub fn remediation(err: &anyhow::Error) -> Option<String> {
  err.chain().find_map(|cause| {
    if let Some(e) = cause.downcast_ref::<MindsetError>() {
      Some(e.remediation())
    } else if let Some(e) = cause.downcast_ref::<SessionError>() {
      Some(e.remediation())
    } else if let Some(e) = cause.downcast_ref::<StoreError>() {
      Some(e.remediation())
    } else if let Some(e) = cause.downcast_ref::<ExtractionError>() {
      Some(e.remediation())
    } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
      Some(e.remediation())
    } else {
      cause.downcast_ref::<AuthError>().map(AuthError::remediation)
    }
  })
}
