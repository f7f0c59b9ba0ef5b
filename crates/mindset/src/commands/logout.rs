use anyhow::Result;

use crate::context::AppContext;

pub fn handle(ctx: &mut AppContext) -> Result<()> {
  if !ctx.is_authenticated() {
    herald::info("Not signed in; nothing to do.");
    return Ok(());
  }
  ctx.logout();
  herald::success("Signed out. The cached Google grant will be removed.");
  Ok(())
}
