use anyhow::{bail, Result};

use crate::advice::Role;
use crate::context::AppContext;
use crate::display;
use crate::matcher::match_advice;
use crate::store::KnowledgeStore;

/// Append the pending batch. It stays on disk until the append succeeds.
pub async fn save(ctx: &mut AppContext) -> Result<()> {
  let pending = ctx.pending();
  if pending.load()?.is_none() {
    bail!("No extracted advice is waiting. Run `mindset analyze <url>` first.");
  }

  let store = ctx.knowledge_store().await?;
  let Some((batch, added)) = pending.commit(&store).await? else {
    bail!("The extracted advice was already saved or discarded by another command.");
  };

  herald::success(&format!("Added {added} item(s) from '{}' to the knowledge base", batch.source.title));
  Ok(())
}

pub fn discard(ctx: &AppContext) -> Result<()> {
  let pending = ctx.pending();
  let _lock = pending.lock()?;
  match pending.load()? {
    Some(batch) => {
      pending.clear()?;
      herald::success(&format!("Discarded {} item(s) from '{}'", batch.items.len(), batch.source.title));
    }
    None => herald::info("No extracted advice is waiting."),
  }
  Ok(())
}

pub fn show(ctx: &AppContext) -> Result<()> {
  match ctx.pending().load()? {
    Some(batch) => {
      herald::announce(&batch.source.title);
      println!("{}\n", batch.source.reference);
      display::print_lines(&display::advice_lines(&batch.items));
    }
    None => herald::info("No extracted advice is waiting."),
  }
  Ok(())
}

/// The knowledge base, optionally narrowed to one role (and champion)
pub async fn list(ctx: &mut AppContext, role: Option<Role>, subject: Option<String>) -> Result<()> {
  let store = ctx.knowledge_store().await?;
  let all = store.fetch_knowledge_base().await?;

  let shown = match role {
    Some(role) => match_advice(&all, role, subject.as_deref().unwrap_or("")),
    None => all,
  };

  if shown.is_empty() {
    herald::info("No advice found.");
    return Ok(());
  }

  herald::announce(&format!("Knowledge base ({} item(s))", shown.len()));
  display::print_lines(&display::advice_lines(&shown));
  Ok(())
}
