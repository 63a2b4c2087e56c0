use opsdesk_core::config::{AppConfig, ConfigError, LoadOptions};
use opsdesk_core::InMemoryAuditSink;
use opsdesk_store::{AuthService, DemoDataset, FileSessionStore};

use crate::commands::CommandResult;

/// Mock directory + configured demo password + file-backed session,
/// mirroring what the dashboard itself would wire together.
fn auth_service() -> Result<AuthService, ConfigError> {
    let config = AppConfig::load(LoadOptions::default())?;
    Ok(AuthService::new(
        DemoDataset::demo_users(),
        config.auth.demo_password,
        Box::new(FileSessionStore::new(config.session.dir)),
        std::sync::Arc::new(InMemoryAuditSink::default()),
    ))
}

pub fn login(username: &str, password: &str) -> CommandResult {
    let auth = match auth_service() {
        Ok(auth) => auth,
        Err(error) => {
            return CommandResult::failure(
                "login",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    match auth.login(username, password) {
        Ok(user) => CommandResult::success(
            "login",
            format!("signed in as {} ({})", user.username, user.role),
        ),
        Err(error) => CommandResult::failure("login", "auth", error.to_string(), 5),
    }
}

pub fn whoami() -> CommandResult {
    let auth = match auth_service() {
        Ok(auth) => auth,
        Err(error) => {
            return CommandResult::failure(
                "whoami",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    match auth.current_user() {
        Ok(user) => CommandResult::success(
            "whoami",
            format!("{} <{}> role={}", user.display_name, user.email, user.role),
        ),
        Err(error) => CommandResult::failure("whoami", "auth", error.to_string(), 5),
    }
}

pub fn logout() -> CommandResult {
    let auth = match auth_service() {
        Ok(auth) => auth,
        Err(error) => {
            return CommandResult::failure(
                "logout",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    match auth.logout() {
        Ok(()) => CommandResult::success("logout", "session cleared"),
        Err(error) => CommandResult::failure("logout", "auth", error.to_string(), 5),
    }
}
