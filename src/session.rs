use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::models::User;

/// One credential token in a fixed file, surviving restarts. The file is
/// re-read on every request, so a purge takes effect immediately for every
/// client holding the same path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<String> {
        let token = std::fs::read_to_string(&self.path).ok()?;
        let token = token.trim().to_string();
        if token.is_empty() { None } else { Some(token) }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
            .with_context(|| format!("failed to persist credential to {}", self.path.display()))
    }

    /// Best-effort removal; a missing file is already the desired state.
    pub fn clear(&self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), %err, "could not clear stored credential");
            }
        }
    }
}

/// Resolved authentication state. A `Session` only exists after identity
/// resolution has finished, so there is no observable loading phase: callers
/// block on `initialize` once and never again.
#[derive(Debug)]
pub enum Session {
    Anonymous,
    Authenticated(User),
}

impl Session {
    /// Exchanges a persisted credential for the current identity. Any
    /// failure, including an unauthorized response, discards the credential
    /// and resolves anonymous.
    pub fn initialize(client: &ApiClient) -> Self {
        if !client.has_token() {
            return Session::Anonymous;
        }

        match client.me() {
            Ok(user) => {
                info!(user = user.display_name(), "session resolved");
                Session::Authenticated(user)
            }
            Err(err) => {
                warn!(%err, "stored credential rejected; signing out");
                client.clear_token();
                Session::Anonymous
            }
        }
    }

    pub fn login(client: &ApiClient, email: &str, password: &str) -> Result<Self> {
        let auth = client
            .login(email, password)
            .context("We could not sign you in. Please check your credentials and try again.")?;
        client.store_token(&auth.token)?;
        Ok(Session::Authenticated(auth.user))
    }

    pub fn register(client: &ApiClient, profile: &RegisterProfile) -> Result<Self> {
        let auth = client
            .register(profile)
            .context("We could not create your account right now. Please try again.")?;
        client.store_token(&auth.token)?;
        Ok(Session::Authenticated(auth.user))
    }

    /// Local only: clears the persisted credential and the identity.
    pub fn logout(client: &ApiClient) {
        client.clear_token();
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }

    /// Gate for authenticated commands. `attempted` names the command the
    /// user was trying to run so they can come back to it after signing in.
    pub fn require_user(&self, attempted: &str) -> Result<&User> {
        self.user().ok_or_else(|| {
            anyhow!("You are not signed in. Run `hireflow login`, then retry `{attempted}`.")
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfile {
    pub name: String,
    pub company_name: String,
    pub email: String,
    pub password: String,
}
