//! Composition root for one invocation
//!
//! Owns the configuration, the Google grant and the HTTP client. Commands ask it
//! for ready-to-use collaborators; nothing here is global. Call `teardown` at
//! the end so a refreshed or revoked grant reaches disk.

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::analyzer::PendingStore;
use crate::auth::{AuthError, GoogleAuth, TokenCache};
use crate::config::{AppConfig, ConfigOverrides, ConfigUpdate};
use crate::extraction::GeminiExtractor;
use crate::session::SessionManager;
use crate::store::{SheetsStore, StoreError};
use crate::Result;

const HTTP_TIMEOUT_SECS: u64 = 120;

pub struct AppContext {
  dir: PathBuf,
  config: AppConfig,
  overrides: ConfigOverrides,
  http: Client,
  auth: GoogleAuth,
}

impl AppContext {
  /// Load configuration and any cached grant from `dir`
  pub fn init(dir: impl Into<PathBuf>, overrides: ConfigOverrides) -> Result<Self> {
    let dir = dir.into();
    let config = AppConfig::load(&dir)?.with_overrides(&overrides);

    let http = Client::builder()
      .user_agent(concat!("mindset/", env!("CARGO_PKG_VERSION")))
      .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
      .build()
      .map_err(StoreError::from)?;

    let cached = TokenCache::load(&dir)?;
    let auth = GoogleAuth::new(http.clone(), config.client_id.clone(), config.client_secret.clone(), cached);
    tracing::debug!(dir = %dir.display(), authenticated = auth.is_authenticated(), "context ready");

    Ok(Self { dir, config, overrides, http, auth })
  }

  /// Persist the grant as it now stands
  pub fn teardown(self) -> Result<()> {
    self.auth.persist(&self.dir)
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn config(&self) -> &AppConfig {
    &self.config
  }

  pub fn is_authenticated(&self) -> bool {
    self.auth.is_authenticated()
  }

  pub fn sessions(&self) -> SessionManager {
    SessionManager::new(&self.dir)
  }

  pub fn pending(&self) -> PendingStore {
    PendingStore::new(&self.dir)
  }

  /// Save a configuration change. A new client id drops the cached grant.
  ///
  /// Only the file contents are updated; per-invocation overrides are applied
  /// again on top for the rest of this run.
  pub fn update_config(&mut self, update: ConfigUpdate) -> Result<bool> {
    let mut saved = AppConfig::load(&self.dir)?;
    let client_changed = saved.apply(update);
    saved.save(&self.dir)?;

    self.config = saved.with_overrides(&self.overrides);
    if client_changed {
      tracing::info!("client id changed; discarding cached Google grant");
      self.auth = GoogleAuth::new(
        self.http.clone(),
        self.config.client_id.clone(),
        self.config.client_secret.clone(),
        None,
      );
    }
    Ok(client_changed)
  }

  /// A sheets store with a live access token
  pub async fn knowledge_store(&mut self) -> Result<SheetsStore> {
    let spreadsheet_id = self.config.require_spreadsheet()?.to_string();
    self.config.require_client_id()?;
    if !self.auth.is_authenticated() {
      return Err(AuthError::NotSignedIn.into());
    }
    let token = self.auth.access_token().await?;
    Ok(SheetsStore::new(self.http.clone(), spreadsheet_id, token))
  }

  pub fn extractor(&self) -> Result<GeminiExtractor> {
    let key = self.config.require_gemini_key()?;
    Ok(GeminiExtractor::new(
      self.http.clone(),
      key,
      self.config.gemini_model.clone(),
      self.config.advice_language.clone(),
    ))
  }

  pub async fn login<F>(&mut self, show_url: F) -> Result<()>
  where
    F: FnOnce(&Url),
  {
    self.config.require_client_id()?;
    self.auth.login(show_url).await?;
    Ok(())
  }

  pub fn logout(&mut self) {
    self.auth.logout();
  }
}
