use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::severity::{ParsePolicy, Thresholds};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub severity: SeverityConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    File,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,
    #[serde(default = "default_source_path")]
    pub path: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,
    #[serde(default)]
    pub remote_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    #[serde(default = "default_good_threshold")]
    pub good: f64,
    #[serde(default = "default_warning_threshold")]
    pub warning: f64,
    #[serde(default)]
    pub parse_policy: ParsePolicy,
}

impl SeverityConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            good: self.good,
            warning: self.warning,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub telegram_bot_token: String,
    #[serde(default)]
    pub telegram_chat_id: String,
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
}

impl NotifyConfig {
    /// Config values win; the ROLLCALL_BOT_TOKEN / ROLLCALL_CHAT_ID
    /// environment variables fill in whichever is blank.
    pub fn telegram_credentials(&self) -> Option<(String, String)> {
        let token = non_empty(&self.telegram_bot_token)
            .or_else(|| env_non_empty("ROLLCALL_BOT_TOKEN"))?;
        let chat_id =
            non_empty(&self.telegram_chat_id).or_else(|| env_non_empty("ROLLCALL_CHAT_ID"))?;
        Some((token, chat_id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_path: Option<String>,
    pub store_path: Option<String>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/rollcall/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(source_path) = overrides.source_path {
            self.source.kind = SourceKind::File;
            self.source.path = source_path;
        }
        if let Some(store_path) = overrides.store_path {
            self.storage.path = store_path;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_source_path(&self) -> PathBuf {
        expand_tilde(&self.source.path)
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        expand_tilde(&self.storage.path)
    }

    pub fn resolved_fallback_path(&self) -> PathBuf {
        expand_tilde(&self.storage.fallback_path)
    }

    pub fn default_template() -> String {
        let template = r#"[source]
kind = "file"            # "file" | "http"
path = "attendance.json"
url = ""

[storage]
path = "~/.local/share/rollcall/stored_attendance.json"
fallback_path = "stored_attendance.json"
remote_url = ""          # optional GET/PUT endpoint tried before the files

[severity]
good = 90.0              # the relaxed deployment pair is 85.0 / 75.0
warning = 75.0
parse_policy = "strict"  # "strict" | "lenient"

[notify]
telegram_bot_token = ""  # or set ROLLCALL_BOT_TOKEN
telegram_chat_id = ""    # or set ROLLCALL_CHAT_ID
enable_stdout = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            path: default_source_path(),
            url: String::new(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            fallback_path: default_fallback_path(),
            remote_url: String::new(),
        }
    }
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            good: default_good_threshold(),
            warning: default_warning_threshold(),
            parse_policy: ParsePolicy::default(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            telegram_chat_id: String::new(),
            enable_stdout: default_enable_stdout(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|v| non_empty(&v))
}

fn default_source_path() -> String {
    "attendance.json".to_string()
}

fn default_store_path() -> String {
    "~/.local/share/rollcall/stored_attendance.json".to_string()
}

fn default_fallback_path() -> String {
    "stored_attendance.json".to_string()
}

fn default_good_threshold() -> f64 {
    90.0
}

fn default_warning_threshold() -> f64 {
    75.0
}

fn default_enable_stdout() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides, SourceKind};
    use crate::severity::ParsePolicy;

    #[test]
    fn template_parses_back_into_defaults() {
        let config: Config = toml::from_str(&Config::default_template()).unwrap();
        assert_eq!(config.source.kind, SourceKind::File);
        assert_eq!(config.severity.good, 90.0);
        assert_eq!(config.severity.warning, 75.0);
        assert_eq!(config.severity.parse_policy, ParsePolicy::Strict);
        assert!(config.notify.enable_stdout);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: Config = toml::from_str("[severity]\ngood = 85.0\n").unwrap();
        assert_eq!(config.severity.good, 85.0);
        assert_eq!(config.severity.warning, 75.0);
        assert_eq!(config.storage.fallback_path, "stored_attendance.json");
    }

    #[test]
    fn overrides_replace_source_and_store_paths() {
        let mut config = Config::default();
        config.apply_overrides(ConfigOverrides {
            source_path: Some("today.json".to_string()),
            store_path: Some("/tmp/stored.json".to_string()),
        });
        assert_eq!(config.source.path, "today.json");
        assert_eq!(config.storage.path, "/tmp/stored.json");
    }
}
