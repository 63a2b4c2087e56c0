use std::env;

use opsdesk_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let redacted = config.redacted();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "session.dir",
        &redacted.session_dir.display().to_string(),
        source("OPSDESK_SESSION_DIR"),
    ));
    lines.push(render_line(
        "auth.demo_password",
        redacted.demo_password,
        source("OPSDESK_DEMO_PASSWORD"),
    ));
    lines.push(render_line(
        "logging.level",
        &redacted.log_level,
        source_either("OPSDESK_LOGGING_LEVEL", "OPSDESK_LOG_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", redacted.log_format).to_lowercase(),
        source_either("OPSDESK_LOGGING_FORMAT", "OPSDESK_LOG_FORMAT"),
    ));

    lines.join("\n")
}

fn render_line(key: &str, value: &str, source: &'static str) -> String {
    format!("{key} = {value} (source: {source})")
}

fn source(env_key: &str) -> &'static str {
    if env_is_set(env_key) {
        "env"
    } else {
        "file-or-default"
    }
}

fn source_either(primary: &str, fallback: &str) -> &'static str {
    if env_is_set(primary) || env_is_set(fallback) {
        "env"
    } else {
        "file-or-default"
    }
}

fn env_is_set(key: &str) -> bool {
    env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::render_line;

    #[test]
    fn lines_carry_key_value_and_source() {
        assert_eq!(
            render_line("session.dir", ".opsdesk", "file-or-default"),
            "session.dir = .opsdesk (source: file-or-default)"
        );
    }
}
