use anyhow::{bail, Result};
use chrono::Utc;
use dialoguer::Confirm;
use std::io::IsTerminal;

use crate::analyzer;
use crate::context::AppContext;
use crate::display;
use crate::extraction::ExtractionRequest;

pub async fn handle(
  ctx: &mut AppContext,
  url: String,
  notes: Option<String>,
  title: Option<String>,
  yes: bool,
) -> Result<()> {
  let extractor = ctx.extractor()?;
  let pending = ctx.pending();
  if let Some(waiting) = pending.load()? {
    if !yes {
      bail!(
        "{} item(s) from '{}' are still waiting. Run `mindset advice save` or `mindset advice discard` first, or pass --yes to replace them.",
        waiting.items.len(),
        waiting.source.title
      );
    }
    herald::warn(&format!(
      "Replacing {} unsaved item(s) from '{}'",
      waiting.items.len(),
      waiting.source.title
    ));
  }

  let request = ExtractionRequest { video_url: url, notes: notes.unwrap_or_default() };

  herald::announce("Analyzing video");
  herald::info(&format!("Asking {} about {}", ctx.config().gemini_model, request.video_url));
  herald::info("This can take a minute while the model looks the video up.");

  let batch = analyzer::analyze(&extractor, &request, title.as_deref(), Utc::now()).await?;
  if batch.is_empty() {
    herald::warn("No actionable advice was found for this video.");
    return Ok(());
  }

  println!();
  display::print_lines(&display::advice_lines(&batch.items));
  println!();

  pending.save(&batch)?;
  herald::info(&format!("Extracted {} item(s) from '{}'", batch.items.len(), batch.source.title));

  let accept = if yes {
    true
  } else if std::io::stdin().is_terminal() {
    Confirm::new()
      .with_prompt(format!("Add these {} item(s) to the knowledge base?", batch.items.len()))
      .default(true)
      .interact()?
  } else {
    false
  };

  if accept {
    super::advice::save(ctx).await
  } else {
    herald::info("Kept for later. Run `mindset advice save` to add it, or `mindset advice discard`.");
    Ok(())
  }
}
