use anyhow::{bail, Result};
use colored::Colorize;

use crate::config::{AppConfig, ConfigUpdate};
use crate::context::AppContext;

pub fn show(ctx: &AppContext) -> Result<()> {
  herald::announce("mindset configuration");
  println!("{} {}", "directory:".dimmed(), AppConfig::path(ctx.dir()).display());
  for (name, value) in ctx.config().display_entries() {
    println!("{:>16}: {}", name.bold(), value);
  }

  if ctx.is_authenticated() {
    herald::success("Signed in to Google");
  } else {
    herald::warn("Not signed in to Google. Run `mindset login`.");
  }
  Ok(())
}

pub fn set(ctx: &mut AppContext, update: ConfigUpdate) -> Result<()> {
  if update.is_empty() {
    bail!("Nothing to set. See `mindset config set --help` for the available settings.");
  }

  let client_changed = ctx.update_config(update)?;
  herald::success(&format!("Saved {}", AppConfig::path(ctx.dir()).display()));
  if client_changed {
    herald::warn("The OAuth client changed, so the cached Google sign-in was discarded. Run `mindset login`.");
  }
  Ok(())
}
