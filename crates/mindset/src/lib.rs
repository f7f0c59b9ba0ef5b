//! mindset: a coaching journal for ranked games
//!
//! Advice is extracted from coaching videos, kept in a Google spreadsheet, and
//! turned into a per-match checklist. Every reviewed match is recorded with how
//! much of the checklist was followed, and the dashboard relates that adherence
//! to the win rate.

pub mod advice;
pub mod analyzer;
pub mod auth;
pub mod commands;
pub mod config;
pub mod context;
pub mod display;
pub mod error;
pub mod extraction;
pub mod matcher;
pub mod record;
pub mod session;
pub mod state;
pub mod stats;
pub mod store;

pub use error::{MindsetError, Result};
