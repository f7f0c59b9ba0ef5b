use anyhow::{bail, Result};
use chrono::Utc;

use crate::advice::Role;
use crate::context::AppContext;
use crate::display;
use crate::record::GameResult;
use crate::session::SessionError;

fn print_status(ctx: &AppContext) -> Result<()> {
  let session = ctx.sessions().load()?;
  display::print_lines(&display::session_lines(&session));
  Ok(())
}

/// Configure the match and load its checklist
pub async fn start(
  ctx: &mut AppContext,
  role: Option<Role>,
  subject: Option<String>,
  result: Option<GameResult>,
) -> Result<()> {
  let sessions = ctx.sessions();
  let _lock = sessions.lock()?;
  let mut session = sessions.load()?;

  session.configure(role, subject.as_deref(), result)?;
  sessions.save(&session)?;
  session.ready_to_review()?;

  let store = ctx.knowledge_store().await?;
  let total = session.begin_review(&store).await?;
  sessions.save(&session)?;

  herald::announce(&format!("{} {} checklist", session.setup.role, session.setup.subject));
  if total == 0 {
    herald::warn("No advice available for this match.");
  }
  print_status(ctx)?;
  if total > 0 {
    herald::info("Tick what you followed with `mindset review check <number>...`, then `mindset review save`.");
  }
  Ok(())
}

pub fn status(ctx: &AppContext) -> Result<()> {
  print_status(ctx)
}

/// Toggle items by their 1-based numbers. Either every number applies or none does.
pub fn check(ctx: &AppContext, numbers: &[usize]) -> Result<()> {
  if numbers.is_empty() {
    bail!("Give at least one item number, e.g. `mindset review check 1 3`.");
  }

  let sessions = ctx.sessions();
  let _lock = sessions.lock()?;
  let mut session = sessions.load()?;
  for &number in numbers {
    if number == 0 {
      bail!("Item numbers start at 1.");
    }
    session.toggle(number - 1)?;
  }
  sessions.save(&session)?;

  print_status(ctx)
}

pub fn note(ctx: &AppContext, text: &str) -> Result<()> {
  let sessions = ctx.sessions();
  let _lock = sessions.lock()?;
  let mut session = sessions.load()?;
  session.set_note(text)?;
  sessions.save(&session)?;
  herald::success("Note updated");
  Ok(())
}

pub fn back(ctx: &AppContext) -> Result<()> {
  let sessions = ctx.sessions();
  let _lock = sessions.lock()?;
  let mut session = sessions.load()?;
  session.back()?;
  sessions.save(&session)?;
  herald::info(&format!(
    "Checklist dropped. Still set up for {} {}; run `mindset review start` to reload it.",
    session.setup.role, session.setup.subject
  ));
  Ok(())
}

pub async fn save(ctx: &mut AppContext) -> Result<()> {
  let sessions = ctx.sessions();
  if !sessions.load()?.is_reviewing() {
    return Err(SessionError::NotReviewing.into());
  }

  let store = ctx.knowledge_store().await?;
  let record = sessions.record(&store, Utc::now()).await?;

  herald::spotlight(&format!("{} on {} recorded", record.result, record.subject));
  herald::success!(
    "Followed {} of {} ({}) as {}",
    record.checked_count,
    record.total_count,
    display::format_rate(record.achievement_rate),
    record.role
  );
  Ok(())
}
