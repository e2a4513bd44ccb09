use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::model::reminder::DriftPolicy;
use crate::notify::DEFAULT_UNREAD_LIMIT;
use crate::time::{DEFAULT_HISTORY_FROM, parse_instant};

/// Directory under the project root that holds the store and config.
pub const LEAFLOG_DIR: &str = ".leaflog";

/// Store file name inside [`LEAFLOG_DIR`].
pub const STORE_FILE: &str = "leaflog.db";

/// Environment variable that overrides the store path.
pub const STORE_PATH_ENV: &str = "LEAFLOG_DB";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Lower bound used when a history query omits `from`. Must be a fixed
    /// instant, never relative to now.
    #[serde(default = "default_history_from")]
    pub default_from: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_from: default_history_from(),
        }
    }
}

impl HistoryConfig {
    /// # Errors
    ///
    /// Returns an error if `default_from` is not a date or timestamp.
    pub fn default_from_instant(&self) -> Result<DateTime<Utc>> {
        parse_instant(&self.default_from)
            .with_context(|| format!("Invalid [history] default_from '{}'", self.default_from))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    #[serde(default = "default_growth_days")]
    pub default_days: i64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            default_days: default_growth_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default)]
    pub drift_policy: DriftPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_unread_limit")]
    pub unread_limit: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            unread_limit: default_unread_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
    pub store_path: PathBuf,
}

/// Load `.leaflog/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(LEAFLOG_DIR).join("config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.history.default_from_instant()?;
    Ok(config)
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("leaflog/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Merge project config, user config and environment into one view.
///
/// # Errors
///
/// Returns an error if either config file is malformed.
pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);
    let store_path = resolve_store_path(project_root, env::var(STORE_PATH_ENV).ok());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
        store_path,
    })
}

/// `LEAFLOG_DB` if set and non-empty, else `<root>/.leaflog/leaflog.db`.
#[must_use]
pub fn resolve_store_path(project_root: &Path, env_path: Option<String>) -> PathBuf {
    env_path
        .filter(|raw| !raw.trim().is_empty())
        .map_or_else(
            || project_root.join(LEAFLOG_DIR).join(STORE_FILE),
            PathBuf::from,
        )
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_history_from() -> String {
    DEFAULT_HISTORY_FROM.to_string()
}

const fn default_growth_days() -> i64 {
    30
}

const fn default_unread_limit() -> u32 {
    DEFAULT_UNREAD_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project_with_config(content: &str) -> TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        let leaflog = dir.path().join(LEAFLOG_DIR);
        std::fs::create_dir_all(&leaflog).expect("create .leaflog");
        std::fs::write(leaflog.join("config.toml"), content).expect("write config");
        dir
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.history.default_from, "2024-01-01");
        assert_eq!(cfg.growth.default_days, 30);
        assert_eq!(cfg.reminders.drift_policy, DriftPolicy::Anchored);
        assert_eq!(cfg.notifications.unread_limit, 20);
    }

    #[test]
    fn partial_project_config_keeps_other_defaults() {
        let root = project_with_config(
            r#"
[growth]
default_days = 90

[reminders]
drift_policy = "from_occurrence"
"#,
        );
        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.growth.default_days, 90);
        assert_eq!(cfg.reminders.drift_policy, DriftPolicy::FromOccurrence);
        assert_eq!(cfg.history.default_from, "2024-01-01");
    }

    #[test]
    fn bad_history_default_is_rejected_at_load() {
        let root = project_with_config("[history]\ndefault_from = \"last tuesday\"\n");
        assert!(load_project_config(root.path()).is_err());
    }

    #[test]
    fn malformed_toml_names_the_file() {
        let root = project_with_config("[growth\n");
        let err = load_project_config(root.path()).expect_err("malformed");
        assert!(format!("{err:#}").contains("config.toml"));
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        let output = resolve_output(true, Some("pretty".to_string()), Some("text".to_string()));
        assert_eq!(output, "json");
    }

    #[test]
    fn env_format_beats_user_config() {
        let output = resolve_output(false, Some("json".to_string()), Some("plain".to_string()));
        assert_eq!(output, "text");

        let output = resolve_output(false, Some("human".to_string()), Some("bogus".to_string()));
        assert_eq!(output, "pretty");
    }

    #[test]
    fn store_path_env_override() {
        let root = Path::new("/srv/garden");
        assert_eq!(
            resolve_store_path(root, None),
            PathBuf::from("/srv/garden/.leaflog/leaflog.db")
        );
        assert_eq!(
            resolve_store_path(root, Some("  ".to_string())),
            PathBuf::from("/srv/garden/.leaflog/leaflog.db")
        );
        assert_eq!(
            resolve_store_path(root, Some("/tmp/other.db".to_string())),
            PathBuf::from("/tmp/other.db")
        );
    }

    #[test]
    fn user_config_parses_output() {
        let cfg: UserConfig = toml::from_str("output = \"json\"\n").expect("parse");
        assert_eq!(cfg.output.as_deref(), Some("json"));
    }
}
