//! Daemon configuration.
//!
//! Configuration is loaded once at startup from a TOML file at:
//! 1. the path given with `--config`
//! 2. `$MAILSORT_CONFIG` (environment variable)
//! 3. `./mailsort.toml`
//! 4. `~/.config/mailsort/config.toml` (Linux/macOS)
//!    `%APPDATA%\mailsort\config.toml` (Windows)
//! 5. Built-in defaults
//!
//! `$MAILSORT_PASSWORD`, when set, replaces `mailbox.password`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SorterError};
use crate::model::category::{default_rules, CategoryRule, CategoryTable, DEFAULT_FALLBACK};
use crate::parser::mime::NO_SUBJECT;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "MAILSORT_CONFIG";

/// Environment variable overriding the mailbox password.
pub const PASSWORD_ENV: &str = "MAILSORT_PASSWORD";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Mail server and account.
    pub mailbox: MailboxConfig,
    /// Poll timing.
    pub schedule: ScheduleConfig,
    /// Where attachments and logs go.
    pub storage: StorageConfig,
    /// Category keyword table.
    pub classification: ClassificationConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Mail server and account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// IMAP server host name.
    pub host: String,
    /// IMAP server port (993 for implicit TLS).
    pub port: u16,
    /// Use implicit TLS. Plain TCP is only meant for local test servers.
    pub tls: bool,
    /// Login name, usually the mailbox address.
    pub address: String,
    /// Password or app password.
    pub password: String,
    /// Mailbox to select.
    pub folder: String,
    /// IMAP search criteria selecting the messages to process.
    pub search: String,
}

/// Poll timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes between two mail checks.
    pub interval_minutes: u64,
    /// Milliseconds slept between checks for a due run.
    pub tick_millis: u64,
    /// Check mail right after startup instead of waiting one interval.
    pub run_at_startup: bool,
}

/// Where attachments and logs go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the `<category>/<filename>` attachment tree.
    pub attachments_dir: PathBuf,
    /// Directory holding the CSV and diagnostic logs.
    pub log_dir: PathBuf,
    /// CSV audit log file name inside `log_dir`.
    pub csv_file: String,
    /// Diagnostic log file name inside `log_dir`.
    pub diagnostic_file: String,
}

/// Category keyword table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Category for subjects that match no keyword.
    pub fallback: String,
    /// Subject recorded for messages without one.
    pub no_subject: String,
    /// Categories in priority order.
    pub categories: Vec<CategoryRule>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            tls: true,
            address: String::new(),
            password: String::new(),
            folder: "INBOX".to_string(),
            search: "UNSEEN".to_string(),
        }
    }
}

impl std::fmt::Debug for MailboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .field("folder", &self.folder)
            .field("search", &self.search)
            .finish()
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
            tick_millis: 1000,
            run_at_startup: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            attachments_dir: PathBuf::from("attachments"),
            log_dir: PathBuf::from("logs"),
            csv_file: "email_log.csv".to_string(),
            diagnostic_file: "service.log".to_string(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            fallback: DEFAULT_FALLBACK.to_string(),
            no_subject: NO_SUBJECT.to_string(),
            categories: default_rules(),
        }
    }
}

// ── Derived values ──────────────────────────────────────────────

impl Config {
    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.interval_minutes == 0 {
            return Err(SorterError::Config(
                "schedule.interval_minutes must be at least 1".into(),
            ));
        }
        if self.schedule.tick_millis == 0 {
            return Err(SorterError::Config(
                "schedule.tick_millis must be at least 1".into(),
            ));
        }
        if self.mailbox.host.trim().is_empty() {
            return Err(SorterError::Config("mailbox.host is empty".into()));
        }
        if self.mailbox.folder.trim().is_empty() {
            return Err(SorterError::Config("mailbox.folder is empty".into()));
        }
        if self.classification.fallback.trim().is_empty() {
            return Err(SorterError::Config(
                "classification.fallback is empty".into(),
            ));
        }
        for rule in &self.classification.categories {
            if rule.name.trim().is_empty() {
                return Err(SorterError::Config("category with empty name".into()));
            }
            // an empty keyword is a substring of every subject
            if rule.keywords.iter().any(|k| k.is_empty()) {
                return Err(SorterError::Config(format!(
                    "category '{}' has an empty keyword",
                    rule.name
                )));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_minutes * 60)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.schedule.tick_millis)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.storage.log_dir.join(&self.storage.csv_file)
    }

    pub fn category_table(&self) -> CategoryTable {
        CategoryTable::new(
            self.classification.categories.clone(),
            self.classification.fallback.clone(),
        )
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Missing files fall back to defaults; a file that exists but cannot be
/// read, parsed or validated is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match find_config_file(explicit) {
        Some(path) => {
            let cfg = load_config_file(&path)?;
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        None => {
            tracing::info!("No config file found, using defaults");
            Config::default()
        }
    };

    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        config.mailbox.password = password;
    }

    config.validate()?;
    Ok(config)
}

/// Parse one TOML file without applying environment overrides.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| SorterError::io(path, e))?;
    Ok(toml::from_str::<Config>(&contents)?)
}

/// Pick the first config file that applies.
///
/// An explicitly requested path is returned even if it does not exist, so
/// that loading it reports the problem instead of silently using defaults.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    let local = PathBuf::from("mailsort.toml");
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("mailsort").join("config.toml"))
        .filter(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.mailbox.host, "imap.gmail.com");
        assert_eq!(cfg.mailbox.folder, "INBOX");
        assert_eq!(cfg.mailbox.search, "UNSEEN");
        assert_eq!(cfg.schedule.interval_minutes, 5);
        assert_eq!(cfg.interval(), Duration::from_secs(300));
        assert_eq!(cfg.csv_path(), PathBuf::from("logs").join("email_log.csv"));
        assert_eq!(cfg.classification.fallback, "Другое");
        assert_eq!(cfg.classification.categories.len(), 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.mailbox.host, cfg.mailbox.host);
        assert_eq!(
            parsed.classification.categories,
            cfg.classification.categories
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[mailbox]
host = "mail.example.org"
address = "me@example.org"

[schedule]
interval_minutes = 1
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.mailbox.host, "mail.example.org");
        assert_eq!(cfg.schedule.interval_minutes, 1);
        // Other fields use defaults
        assert_eq!(cfg.mailbox.port, 993);
        assert_eq!(cfg.storage.diagnostic_file, "service.log");
        assert_eq!(cfg.classification.categories.len(), 4);
    }

    #[test]
    fn test_categories_keep_file_order() {
        let text = r#"
[classification]
fallback = "Misc"

[[classification.categories]]
name = "Zeta"
keywords = ["z"]

[[classification.categories]]
name = "Alpha"
keywords = ["a", "b"]
"#;
        let cfg: Config = toml::from_str(text).expect("parse");
        let table = cfg.category_table();
        let names: Vec<&str> = table.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
        assert_eq!(table.fallback(), "Misc");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cfg = Config::default();
        cfg.schedule.interval_minutes = 0;
        assert!(matches!(cfg.validate(), Err(SorterError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_keyword() {
        let mut cfg = Config::default();
        cfg.classification
            .categories
            .push(CategoryRule::new("Broken", &[""]));
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_load_config_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[schedule]\ninterval_minutes = \"soon\"\n").unwrap();
        assert!(matches!(
            load_config_file(&path),
            Err(SorterError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(find_config_file(Some(missing.as_path())), Some(missing.clone()));
        assert!(matches!(
            load_config(Some(missing.as_path())),
            Err(SorterError::Io { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut cfg = MailboxConfig::default();
        cfg.password = "hunter2".into();
        let text = format!("{cfg:?}");
        assert!(!text.contains("hunter2"));
    }
}
