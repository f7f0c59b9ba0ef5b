//! Google OAuth 2.0 for the spreadsheet scope
//!
//! Consent runs through a loopback redirect with PKCE, as Google recommends for
//! installed apps. The resulting grant is cached in `token.json` together with
//! the client id it was issued to, so a changed client id reads as signed out.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::config::write_private;

pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const TOKEN_FILE: &str = "token.json";

const CONSENT_TIMEOUT_SECS: u64 = 300;
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
  #[error("Not signed in to Google")]
  NotSignedIn,

  #[error("Google sign-in did not complete: {message}")]
  ConsentFailed { message: String },

  #[error("Google rejected the token request: {message}")]
  TokenRejected { message: String },

  #[error("Could not reach Google's sign-in service: {message}")]
  Transport { message: String },
}

impl AuthError {
  pub fn remediation(&self) -> String {
    match self {
      AuthError::Transport { .. } => {
        "Check your network connection, then run `mindset login` again.".to_string()
      }
      _ => "Run `mindset login` to sign in with Google.".to_string(),
    }
  }
}

impl From<reqwest::Error> for AuthError {
  fn from(e: reqwest::Error) -> Self {
    AuthError::Transport { message: e.to_string() }
  }
}

/// Cached grant, written to `token.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCache {
  pub client_id: String,
  pub access_token: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub refresh_token: Option<String>,
  pub expires_at: DateTime<Utc>,
}

impl TokenCache {
  pub fn path(dir: &Path) -> PathBuf {
    dir.join(TOKEN_FILE)
  }

  pub fn load(dir: &Path) -> crate::Result<Option<Self>> {
    let path = Self::path(dir);
    if !path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(content.trim())?))
  }

  pub fn save(&self, dir: &Path) -> crate::Result<()> {
    write_private(&Self::path(dir), &serde_json::to_string_pretty(self)?)?;
    Ok(())
  }

  pub fn remove(dir: &Path) -> crate::Result<()> {
    let path = Self::path(dir);
    if path.exists() {
      fs::remove_file(path)?;
    }
    Ok(())
  }

  /// Treat tokens about to lapse as already gone
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now + Duration::seconds(EXPIRY_SLACK_SECS) >= self.expires_at
  }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default)]
  expires_in: Option<i64>,
  #[serde(default)]
  refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
  error: String,
  #[serde(default)]
  error_description: Option<String>,
}

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct Pkce {
  pub verifier: String,
  pub challenge: String,
}

impl Pkce {
  pub fn generate() -> Self {
    let verifier: String =
      rand::thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
    let challenge = challenge_for(&verifier);
    Self { verifier, challenge }
  }
}

pub fn challenge_for(verifier: &str) -> String {
  URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

pub fn consent_url(
  client_id: &str,
  redirect_uri: &str,
  state: &str,
  challenge: &str,
) -> Result<Url, AuthError> {
  Url::parse_with_params(
    AUTH_URL,
    &[
      ("client_id", client_id),
      ("redirect_uri", redirect_uri),
      ("response_type", "code"),
      ("scope", SHEETS_SCOPE),
      ("access_type", "offline"),
      ("prompt", "consent"),
      ("state", state),
      ("code_challenge", challenge),
      ("code_challenge_method", "S256"),
    ],
  )
  .map_err(|e| AuthError::ConsentFailed { message: format!("bad consent url: {e}") })
}

/// Pull the authorization code out of the redirect's request line.
///
/// `request_line` is the first line of the HTTP request the browser sent to the
/// loopback listener, e.g. `GET /?state=..&code=.. HTTP/1.1`.
pub fn parse_redirect(request_line: &str, expected_state: &str) -> Result<String, AuthError> {
  let target = request_line.split_whitespace().nth(1).ok_or_else(|| AuthError::ConsentFailed {
    message: "browser sent an unreadable redirect".to_string(),
  })?;
  let url = Url::parse("http://127.0.0.1")
    .and_then(|base| base.join(target))
    .map_err(|e| AuthError::ConsentFailed { message: format!("bad redirect: {e}") })?;

  let param = |name: &str| {
    url.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
  };

  if let Some(error) = param("error") {
    return Err(AuthError::ConsentFailed { message: format!("consent was refused ({error})") });
  }
  if param("state").as_deref() != Some(expected_state) {
    return Err(AuthError::ConsentFailed {
      message: "redirect state did not match this sign-in attempt".to_string(),
    });
  }
  param("code").filter(|c| !c.is_empty()).ok_or_else(|| AuthError::ConsentFailed {
    message: "redirect carried no authorization code".to_string(),
  })
}

fn redirect_page(ok: bool) -> String {
  let body = if ok {
    "<html><body><h3>Signed in to mindset.</h3><p>You can close this tab.</p></body></html>"
  } else {
    "<html><body><h3>Sign-in failed.</h3><p>Return to the terminal for details.</p></body></html>"
  };
  format!(
    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
    body.len(),
    body
  )
}

/// Holds the current Google grant for the lifetime of one invocation
pub struct GoogleAuth {
  http: Client,
  client_id: String,
  client_secret: Option<String>,
  token_url: String,
  grant: Option<TokenCache>,
}

impl GoogleAuth {
  /// Adopt a cached grant, unless it was issued to a different client
  pub fn new(
    http: Client,
    client_id: impl Into<String>,
    client_secret: Option<String>,
    cached: Option<TokenCache>,
  ) -> Self {
    let client_id = client_id.into();
    let grant = cached.filter(|grant| {
      let same = !client_id.is_empty() && grant.client_id == client_id;
      if !same {
        tracing::info!("cached Google grant belongs to another client id; ignoring it");
      }
      same
    });
    Self { http, client_id, client_secret, token_url: TOKEN_URL.to_string(), grant }
  }

  pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
    self.token_url = token_url.into();
    self
  }

  pub fn is_authenticated(&self) -> bool {
    self.grant.is_some()
  }

  pub fn grant(&self) -> Option<&TokenCache> {
    self.grant.as_ref()
  }

  /// Forget the grant; the next `persist` deletes the cache file
  pub fn logout(&mut self) {
    self.grant = None;
  }

  pub fn persist(&self, dir: &Path) -> crate::Result<()> {
    match &self.grant {
      Some(grant) => grant.save(dir),
      None => TokenCache::remove(dir),
    }
  }

  /// A usable access token, refreshing the grant first if it has lapsed
  pub async fn access_token(&mut self) -> Result<String, AuthError> {
    let grant = self.grant.as_ref().ok_or(AuthError::NotSignedIn)?;
    if !grant.is_expired(Utc::now()) {
      return Ok(grant.access_token.clone());
    }

    let Some(refresh_token) = grant.refresh_token.clone() else {
      tracing::debug!("access token expired and no refresh token is cached");
      self.grant = None;
      return Err(AuthError::NotSignedIn);
    };

    let mut form = vec![
      ("client_id", self.client_id.clone()),
      ("grant_type", "refresh_token".to_string()),
      ("refresh_token", refresh_token.clone()),
    ];
    if let Some(secret) = &self.client_secret {
      form.push(("client_secret", secret.clone()));
    }

    match self.request_token(&form).await {
      Ok(response) => {
        let renewed = self.adopt(response, Some(refresh_token));
        Ok(renewed.access_token.clone())
      }
      Err(AuthError::TokenRejected { message }) => {
        tracing::warn!("refresh token was rejected: {message}");
        self.grant = None;
        Err(AuthError::NotSignedIn)
      }
      Err(e) => Err(e),
    }
  }

  /// Interactive consent. `show_url` is handed the page the user must open.
  pub async fn login<F>(&mut self, show_url: F) -> Result<(), AuthError>
  where
    F: FnOnce(&Url),
  {
    let listener = TcpListener::bind("127.0.0.1:0")
      .await
      .map_err(|e| AuthError::ConsentFailed { message: format!("cannot open loopback port: {e}") })?;
    let port = listener
      .local_addr()
      .map_err(|e| AuthError::ConsentFailed { message: e.to_string() })?
      .port();
    let redirect_uri = format!("http://127.0.0.1:{port}");

    let pkce = Pkce::generate();
    let state = uuid::Uuid::new_v4().simple().to_string();
    show_url(&consent_url(&self.client_id, &redirect_uri, &state, &pkce.challenge)?);

    tracing::debug!(%redirect_uri, "waiting for consent redirect");
    let wait = std::time::Duration::from_secs(CONSENT_TIMEOUT_SECS);
    let code = tokio::time::timeout(wait, receive_code(&listener, &state))
      .await
      .map_err(|_| AuthError::ConsentFailed { message: "timed out waiting for the browser".to_string() })??;

    let mut form = vec![
      ("client_id", self.client_id.clone()),
      ("grant_type", "authorization_code".to_string()),
      ("code", code),
      ("code_verifier", pkce.verifier),
      ("redirect_uri", redirect_uri),
    ];
    if let Some(secret) = &self.client_secret {
      form.push(("client_secret", secret.clone()));
    }

    let response = self.request_token(&form).await?;
    self.adopt(response, None);
    Ok(())
  }

  async fn request_token(&self, form: &[(&str, String)]) -> Result<TokenResponse, AuthError> {
    let response = self.http.post(&self.token_url).form(form).send().await?;
    let status = response.status();
    tracing::debug!(%status, "token endpoint answered");

    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let message = serde_json::from_str::<TokenErrorResponse>(&body)
        .map(|e| match e.error_description {
          Some(description) => format!("{}: {description}", e.error),
          None => e.error,
        })
        .unwrap_or_else(|_| format!("HTTP {status}"));
      return Err(AuthError::TokenRejected { message });
    }

    Ok(response.json().await?)
  }

  fn adopt(&mut self, response: TokenResponse, previous_refresh: Option<String>) -> &TokenCache {
    let lifetime = response.expires_in.unwrap_or(3600);
    self.grant.insert(TokenCache {
      client_id: self.client_id.clone(),
      access_token: response.access_token,
      refresh_token: response.refresh_token.or(previous_refresh),
      expires_at: Utc::now() + Duration::seconds(lifetime),
    })
  }
}

/// Whether a request line carries the consent outcome rather than a stray
/// browser request (preconnect, favicon, a reload of `/`)
fn is_consent_redirect(request_line: &str) -> bool {
  let Some(target) = request_line.split_whitespace().nth(1) else {
    return false;
  };
  Url::parse("http://127.0.0.1")
    .and_then(|base| base.join(target))
    .map(|url| url.query_pairs().any(|(k, _)| k == "state" || k == "code" || k == "error"))
    .unwrap_or(false)
}

async fn receive_code(listener: &TcpListener, state: &str) -> Result<String, AuthError> {
  loop {
    let (mut stream, _) = listener
      .accept()
      .await
      .map_err(|e| AuthError::ConsentFailed { message: e.to_string() })?;

    let mut buffer = vec![0u8; 8192];
    let read = match stream.read(&mut buffer).await {
      Ok(0) => continue,
      Ok(read) => read,
      Err(e) => {
        tracing::debug!("dropping unreadable loopback connection: {e}");
        continue;
      }
    };
    let request = String::from_utf8_lossy(&buffer[..read]);
    let line = request.lines().next().unwrap_or_default();

    if !is_consent_redirect(line) {
      tracing::debug!(%line, "ignoring loopback request without a consent outcome");
      let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
      continue;
    }

    let outcome = parse_redirect(line, state);
    let _ = stream.write_all(redirect_page(outcome.is_ok()).as_bytes()).await;
    let _ = stream.shutdown().await;
    return outcome;
  }
}

impl std::fmt::Debug for GoogleAuth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GoogleAuth")
      .field("client_id", &self.client_id)
      .field("authenticated", &self.grant.is_some())
      .finish()
  }
}
