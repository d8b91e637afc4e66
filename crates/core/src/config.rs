//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/tldw/config.toml`. Every section is
//! optional; missing values fall back to defaults and API keys may also come
//! from the environment.
//!
//! Directory layout:
//! - Config: `$XDG_CONFIG_HOME/tldw/`
//! - Data (sessions, preferences): `$XDG_DATA_HOME/tldw/` or `TLDW_DATA_DIR`
//! - State (logs): `$XDG_STATE_HOME/tldw/`

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TldwError};
use crate::provider::Provider;

const APP_DIR: &str = "tldw";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn xdg_state_home() -> PathBuf {
    std::env::var_os("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(dirs::state_dir)
        .unwrap_or_else(|| home_dir().join(".local/state"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Text model provider configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Overrides the provider's default model name
    pub model: Option<String>,
    /// Takes precedence over the provider's environment variable
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key; without it only placeholder metadata is used
    pub api_key: Option<String>,
    /// Path or name of the yt-dlp binary
    #[serde(default = "default_ytdlp")]
    pub ytdlp: String,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            ytdlp: default_ytdlp(),
        }
    }
}

fn default_ytdlp() -> String {
    "yt-dlp".to_string()
}

/// Facet limits for a single analysis run
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_max_takeaways")]
    pub max_takeaways: usize,

    #[serde(default = "default_max_quotes")]
    pub max_quotes: usize,

    #[serde(default = "default_max_action_items")]
    pub max_action_items: usize,

    #[serde(default = "default_max_topics")]
    pub max_topics: usize,

    #[serde(default = "default_max_timeline")]
    pub max_timeline: usize,

    #[serde(default = "default_max_qa")]
    pub max_qa: usize,

    /// Transcript text is cut to this many chars before prompting
    #[serde(default = "default_max_transcript_chars")]
    pub max_transcript_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_takeaways: default_max_takeaways(),
            max_quotes: default_max_quotes(),
            max_action_items: default_max_action_items(),
            max_topics: default_max_topics(),
            max_timeline: default_max_timeline(),
            max_qa: default_max_qa(),
            max_transcript_chars: default_max_transcript_chars(),
        }
    }
}

fn default_max_takeaways() -> usize {
    10
}

fn default_max_quotes() -> usize {
    5
}

fn default_max_action_items() -> usize {
    8
}

fn default_max_topics() -> usize {
    12
}

fn default_max_timeline() -> usize {
    10
}

fn default_max_qa() -> usize {
    5
}

fn default_max_transcript_chars() -> usize {
    500_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session directory override
    pub dir: Option<PathBuf>,

    /// Age in days after which `sessions cleanup` removes a session
    #[serde(default = "default_timeout_days")]
    pub timeout_days: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dir: None,
            timeout_days: default_timeout_days(),
        }
    }
}

fn default_timeout_days() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Config::default()
        };

        Ok(config.with_env_overrides())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TldwError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| TldwError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Environment variables win over file values
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = self.model.provider.env_api_key() {
            self.model.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("YOUTUBE_API_KEY") {
            self.youtube.api_key = Some(key);
        }
        if let Some(dir) = non_empty_env("TLDW_DATA_DIR") {
            self.session.dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// `~/.config/tldw/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| home_dir().join(".config"))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// `~/.local/share/tldw/`
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| home_dir().join(".local/share"))
            .join(APP_DIR)
    }

    /// `~/.local/state/tldw/`
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Where saved sessions live
    pub fn sessions_dir(&self) -> PathBuf {
        self.session
            .dir
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("sessions"))
    }
}

pub(crate) fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.provider, Provider::Gemini);
        assert_eq!(config.analysis.max_takeaways, 10);
        assert_eq!(config.analysis.max_quotes, 5);
        assert_eq!(config.analysis.max_action_items, 8);
        assert_eq!(config.analysis.max_topics, 12);
        assert_eq!(config.analysis.max_timeline, 10);
        assert_eq!(config.analysis.max_qa, 5);
        assert_eq!(config.session.timeout_days, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[model]
provider = "openai"
model = "gpt-4o-mini"

[analysis]
max_takeaways = 5
max_qa = 3
max_transcript_chars = 1000

[session]
dir = "/tmp/tldw-sessions"
timeout_days = 7

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.model.provider, Provider::Openai);
        assert_eq!(config.model.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(config.analysis.max_takeaways, 5);
        assert_eq!(config.analysis.max_quotes, 5);
        assert_eq!(config.analysis.max_qa, 3);
        assert_eq!(config.analysis.max_timeline, 10);
        assert_eq!(config.analysis.max_transcript_chars, 1000);
        assert_eq!(config.session.timeout_days, 7);
        assert_eq!(
            config.sessions_dir(),
            PathBuf::from("/tmp/tldw-sessions")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.youtube.ytdlp, "yt-dlp");
    }

    #[test]
    fn test_load_from_reports_path_on_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analysis\nmax_quotes = ").unwrap();

        match Config::load_from(&path) {
            Err(TldwError::Config { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_paths_end_with_app_dir() {
        assert!(Config::config_path().ends_with("tldw/config.toml"));
        assert!(Config::state_dir().ends_with("tldw"));
    }
}
