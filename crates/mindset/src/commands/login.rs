use anyhow::Result;

use crate::context::AppContext;

pub async fn handle(ctx: &mut AppContext) -> Result<()> {
  herald::announce("Google sign-in");

  ctx
    .login(|url| {
      herald::info("Open this page in your browser and approve spreadsheet access:");
      println!("\n  {url}\n");
      herald::info("Waiting for the browser to come back...");
    })
    .await?;

  herald::success("Signed in. Spreadsheet access is ready.");
  Ok(())
}
