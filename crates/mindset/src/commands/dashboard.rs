use anyhow::Result;

use crate::context::AppContext;
use crate::display;
use crate::stats;
use crate::store::KnowledgeStore;

pub async fn handle(ctx: &mut AppContext, json: bool) -> Result<()> {
  let store = ctx.knowledge_store().await?;
  let history = store.fetch_match_history().await?;
  let summary = stats::aggregate(&history);

  if json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
    return Ok(());
  }

  herald::announce("Performance dashboard");
  display::print_lines(&display::dashboard_lines(&summary));
  Ok(())
}
