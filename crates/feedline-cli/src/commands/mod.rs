//! CLI command implementations.

mod auth;
mod posts;
mod profile;

pub use auth::{login, logout, register, status, whoami};
pub use posts::{feed, post};
pub use profile::{profile_show, profile_update};

use anyhow::{Context, Result};
use api_boundary::{ApiClient, PostsGateway, User};
use client_config_and_utils::{Config, Paths};
use session_store::{decide_access, AccessDecision, BootstrapOutcome, SessionStore};
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a command needs: the session store and the stateless gateways.
pub struct App {
    pub store: Arc<SessionStore>,
    pub posts: PostsGateway,
}

impl App {
    /// Wire the store and gateways against the configured provider.
    pub fn new(config: &Config, paths: &Paths) -> Result<Self> {
        let api_url = config.api_url()?;
        let client = ApiClient::new(api_url.as_str())
            .context("Failed to create HTTP client")?;

        let vault = client_storage::create_credential_vault(paths);
        let store = Arc::new(SessionStore::with_client(vault, client.clone()));

        Ok(Self {
            store,
            posts: PostsGateway::new(client),
        })
    }

    /// Start restoring the persisted session in the background.
    pub fn spawn_bootstrap(&self) -> tokio::task::JoinHandle<()> {
        let store = self.store.clone();
        tokio::spawn(async move {
            match store.bootstrap().await {
                BootstrapOutcome::Restored(user) => debug!(user_id = %user.id, "Session restored"),
                BootstrapOutcome::NoSession => debug!("No stored session"),
                BootstrapOutcome::Rejected(e) => info!(error = %e, "Stored session was rejected"),
                BootstrapOutcome::Corrupt(reason) => {
                    warn!(reason = %reason, "Stored session was corrupt")
                }
                BootstrapOutcome::StorageUnavailable(reason) => {
                    warn!(reason = %reason, "Credential storage unavailable")
                }
                BootstrapOutcome::Superseded => debug!("Bootstrap superseded by logout"),
                BootstrapOutcome::AlreadyStarted => {}
            }
        })
    }

    /// Wait for bootstrap, then require a signed-in user.
    pub async fn require_user(&self) -> Result<User> {
        self.store.ready().await;
        match decide_access(&self.store.snapshot()) {
            AccessDecision::Allow(user) => Ok(user),
            AccessDecision::RedirectToLogin => {
                anyhow::bail!("Not logged in. Run 'feedline login' first")
            }
            AccessDecision::Wait => anyhow::bail!("Session is still loading"),
        }
    }
}

/// Prompt for a line of input. Returns the trimmed value.
fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().lock().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

/// Use the given value or prompt for one; empty values are rejected.
fn value_or_prompt(value: Option<String>, prompt: &str, field: &str) -> Result<String> {
    let value = match value {
        Some(value) => value.trim().to_string(),
        None => prompt_line(prompt)?,
    };
    if value.is_empty() {
        anyhow::bail!("{} is required", field);
    }
    Ok(value)
}

/// Read a password without echo on a terminal, or one line from piped stdin.
fn read_password() -> Result<String> {
    let password = if io::stdin().is_terminal() {
        rpassword::prompt_password("Password: ")?
    } else {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };

    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
