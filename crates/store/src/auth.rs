use std::sync::Arc;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, warn};

use opsdesk_core::{AuditCategory, AuditEvent, AuditOutcome, AuditSink, Role, User};

use crate::session::{SessionError, SessionRecord, SessionStore};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately covers both an unknown username and a wrong
    /// password, so callers cannot probe the directory.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account `{0}` is deactivated")]
    Inactive(String),
    #[error("not signed in")]
    NotSignedIn,
    #[error("session user `{0}` no longer exists in the directory")]
    StaleSession(String),
    #[error("role `{actual}` may not {action}")]
    Forbidden { action: String, actual: Role },
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Mocked login over a fixed user directory. Every account shares the
/// single configured demo password; there are no per-user credentials.
pub struct AuthService {
    directory: Vec<User>,
    demo_password: SecretString,
    session: Box<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
}

impl AuthService {
    pub fn new(
        directory: Vec<User>,
        demo_password: SecretString,
        session: Box<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { directory, demo_password, session, audit }
    }

    pub fn directory(&self) -> &[User] {
        &self.directory
    }

    fn find_user(&self, username: &str) -> Option<&User> {
        self.directory.iter().find(|user| user.username == username)
    }

    fn audit_login(&self, username: &str, outcome: AuditOutcome, detail: &str) {
        self.audit.emit(
            AuditEvent::new(None, "auth.login", AuditCategory::Auth, username, outcome)
                .with_metadata("detail", detail),
        );
    }

    /// Checks the shared demo password, then the directory. On success
    /// the session is written through the configured store.
    pub fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if password != self.demo_password.expose_secret() {
            warn!(username, "login refused: wrong password");
            self.audit_login(username, AuditOutcome::Rejected, "wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = match self.find_user(username) {
            Some(user) => user.clone(),
            None => {
                warn!(username, "login refused: unknown username");
                self.audit_login(username, AuditOutcome::Rejected, "unknown username");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !user.active {
            warn!(username, "login refused: account deactivated");
            self.audit_login(username, AuditOutcome::Rejected, "account deactivated");
            return Err(AuthError::Inactive(username.to_owned()));
        }

        self.session.save(&SessionRecord {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            logged_in_at: Utc::now(),
        })?;

        info!(username, role = %user.role, "login succeeded");
        self.audit_login(username, AuditOutcome::Success, "signed in");
        Ok(user)
    }

    /// Resolves the persisted session back to a directory entry.
    pub fn current_user(&self) -> Result<User, AuthError> {
        let record = self.session.load()?.ok_or(AuthError::NotSignedIn)?;
        let user = self
            .find_user(&record.username)
            .cloned()
            .ok_or_else(|| AuthError::StaleSession(record.username.clone()))?;

        if !user.active {
            return Err(AuthError::Inactive(user.username));
        }
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        let record = self.session.load()?;
        self.session.clear()?;

        if let Some(record) = record {
            info!(username = %record.username, "logout");
            self.audit.emit(AuditEvent::new(
                None,
                "auth.logout",
                AuditCategory::Auth,
                record.username,
                AuditOutcome::Success,
            ));
        }
        Ok(())
    }
}

/// Role gate shared by the services. `action` reads as a verb phrase in
/// the error ("role `employee` may not delete invoices").
pub fn require_role(user: &User, allowed: &[Role], action: &str) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(AuthError::Forbidden { action: action.to_owned(), actual: user.role })
}
