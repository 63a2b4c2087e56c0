use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Password every demo account accepts. This is a mocked login layer;
/// there are no real credentials anywhere in the system.
pub const DEFAULT_DEMO_PASSWORD: &str = "agency-demo";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Directory holding the persisted current-user file.
    pub dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub demo_password: SecretString,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub session_dir: Option<PathBuf>,
    pub demo_password: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig { dir: PathBuf::from(".opsdesk") },
            auth: AuthConfig { demo_password: DEFAULT_DEMO_PASSWORD.into() },
            logging: LoggingConfig { level: "info".to_owned(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    session: Option<SessionPatch>,
    auth: Option<AuthPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    demo_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

/// Effective configuration with secrets blanked, for operator display.
#[derive(Debug, Serialize)]
pub struct RedactedConfig {
    pub session_dir: PathBuf,
    pub demo_password: &'static str,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Defaults, then an optional `opsdesk.toml` patch, then `OPSDESK_*`
    /// environment overrides, then programmatic overrides, then
    /// validation.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("opsdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(session) = patch.session {
            if let Some(dir) = session.dir {
                self.session.dir = dir;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(password) = auth.demo_password {
                self.auth.demo_password = password.into();
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OPSDESK_SESSION_DIR") {
            self.session.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("OPSDESK_DEMO_PASSWORD") {
            self.auth.demo_password = value.into();
        }

        let log_level = read_env("OPSDESK_LOGGING_LEVEL").or_else(|| read_env("OPSDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OPSDESK_LOGGING_FORMAT").or_else(|| read_env("OPSDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.session_dir {
            self.session.dir = dir;
        }
        if let Some(password) = overrides.demo_password {
            self.auth.demo_password = password.into();
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("session dir must not be empty".to_owned()));
        }
        if self.auth.demo_password.expose_secret().is_empty() {
            return Err(ConfigError::Validation("demo password must not be empty".to_owned()));
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        let level = self.logging.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unsupported log level `{}` (expected one of {})",
                self.logging.level,
                LEVELS.join("|")
            )));
        }

        Ok(())
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            session_dir: self.session.dir.clone(),
            demo_password: "***",
            log_level: self.logging.level.clone(),
            log_format: self.logging.format,
        }
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    if let Some(value) = read_env("OPSDESK_CONFIG") {
        let path = PathBuf::from(value);
        return path.exists().then_some(path);
    }

    let default = PathBuf::from("opsdesk.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    fn load_from(content: &str) -> Result<AppConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp config file");
        file.write_all(content.as_bytes()).expect("write config");
        AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let config = load_from(
            r#"
[session]
dir = "/tmp/opsdesk-test"

[auth]
demo_password = "letmein"

[logging]
level = "debug"
format = "json"
"#,
        )
        .expect("patched config loads");

        assert_eq!(config.session.dir, PathBuf::from("/tmp/opsdesk-test"));
        assert_eq!(config.auth.demo_password.expose_secret(), "letmein");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let error = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/opsdesk.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect_err("missing file");
        assert!(matches!(error, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let error = load_from("[logging]\nlevel = \"verbose\"\n").expect_err("bad level");
        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn programmatic_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/opsdesk.toml")),
            require_file: false,
            overrides: ConfigOverrides {
                session_dir: Some(PathBuf::from("/tmp/session-override")),
                demo_password: Some("override".to_owned()),
                log_level: Some("warn".to_owned()),
            },
        })
        .expect("overrides load");

        assert_eq!(config.session.dir, PathBuf::from("/tmp/session-override"));
        assert_eq!(config.auth.demo_password.expose_secret(), "override");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn redaction_blanks_the_password() {
        let redacted = AppConfig::default().redacted();
        assert_eq!(redacted.demo_password, "***");
        let json = serde_json::to_value(&redacted).expect("serialize redacted config");
        assert_eq!(json["demo_password"], "***");
    }
}
