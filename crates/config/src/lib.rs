//! Configuration loading, validation, and management for onboardctx.
//!
//! Loads configuration from `~/.onboardctx/config.toml` with environment
//! variable overrides. The resulting `AppConfig` is passed explicitly into
//! store construction; nothing below the binary reads ambient state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.onboardctx/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding generated onboarding data, one subdirectory per repository
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Budget used when a tool call omits `token_budget`
    #[serde(default = "default_token_budget")]
    pub default_token_budget: usize,

    /// Upper bound on loading a repository's documents
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,

    /// Separator placed between documents in the assembled text
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Read-through cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Remote (GitHub) fallback settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// MCP server settings
    #[serde(default)]
    pub mcp: McpConfig,
}

fn default_data_dir() -> PathBuf {
    AppConfig::config_dir().join("data")
}
fn default_token_budget() -> usize {
    10_000
}
fn default_load_timeout_secs() -> u64 {
    30
}
fn default_delimiter() -> String {
    "\n\n".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Fall back to the remote docs repository when local data is missing
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// GitHub repository holding generated docs (`owner/name`)
    #[serde(default = "default_docs_repo")]
    pub docs_repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    /// Repository to fetch code snippets from. Defaults to `docs_repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_repo: Option<String>,

    #[serde(default = "default_code_branch")]
    pub code_branch: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,
}

fn default_docs_repo() -> String {
    "CodeBoarding/GeneratedOnBoardings".into()
}
fn default_branch() -> String {
    "main".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".into()
}
fn default_code_branch() -> String {
    "master".into()
}
fn default_remote_timeout_secs() -> u64 {
    10
}

impl RemoteConfig {
    /// The repository code snippets are fetched from.
    pub fn code_repo(&self) -> &str {
        self.code_repo.as_deref().unwrap_or(&self.docs_repo)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            docs_repo: default_docs_repo(),
            branch: default_branch(),
            api_base: default_api_base(),
            raw_base: default_raw_base(),
            code_repo: None,
            code_branch: default_code_branch(),
            timeout_secs: default_remote_timeout_secs(),
            github_token: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("enabled", &self.enabled)
            .field("docs_repo", &self.docs_repo)
            .field("branch", &self.branch)
            .field("api_base", &self.api_base)
            .field("raw_base", &self.raw_base)
            .field("code_repo", &self.code_repo)
            .field("code_branch", &self.code_branch)
            .field("timeout_secs", &self.timeout_secs)
            .field("github_token", &redact(&self.github_token))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

fn default_server_name() -> String {
    "onboardctx".into()
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.onboardctx/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ONBOARDCTX_DATA_DIR`
    /// - `ONBOARDCTX_DOCS_REPO`
    /// - `ONBOARDCTX_REMOTE` (`0`/`false` disables the remote fallback)
    /// - `GITHUB_TOKEN`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("ONBOARDCTX_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(repo) = lookup("ONBOARDCTX_DOCS_REPO") {
            self.remote.docs_repo = repo;
        }
        if let Some(flag) = lookup("ONBOARDCTX_REMOTE") {
            self.remote.enabled = !matches!(flag.trim(), "0" | "false" | "off" | "no");
        }
        if self.remote.github_token.is_none() {
            self.remote.github_token = lookup("GITHUB_TOKEN").filter(|t| !t.is_empty());
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".onboardctx")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "load_timeout_secs must be > 0".into(),
            ));
        }

        if self.cache.enabled && self.cache.ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.ttl_secs must be > 0 when the cache is enabled".into(),
            ));
        }

        if self.remote.enabled {
            if self.remote.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "remote.timeout_secs must be > 0".into(),
                ));
            }
            if !is_owner_repo(&self.remote.docs_repo) {
                return Err(ConfigError::ValidationError(format!(
                    "remote.docs_repo must look like owner/name, got '{}'",
                    self.remote.docs_repo
                )));
            }
            if !is_owner_repo(self.remote.code_repo()) {
                return Err(ConfigError::ValidationError(format!(
                    "remote.code_repo must look like owner/name, got '{}'",
                    self.remote.code_repo()
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn is_owner_repo(s: &str) -> bool {
    let mut parts = s.split('/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
    )
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_token_budget: default_token_budget(),
            load_timeout_secs: default_load_timeout_secs(),
            delimiter: default_delimiter(),
            cache: CacheConfig::default(),
            remote: RemoteConfig::default(),
            mcp: McpConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_token_budget, 10_000);
        assert_eq!(config.remote.docs_repo, "CodeBoarding/GeneratedOnBoardings");
        assert_eq!(config.remote.code_repo(), "CodeBoarding/GeneratedOnBoardings");
        assert_eq!(config.delimiter, "\n\n");
        assert!(!config.cache.enabled);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.remote.branch, config.remote.branch);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/onboardctx/config.toml"));
        let config = result.unwrap();
        assert_eq!(config.default_token_budget, 10_000);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/onboardings"

[remote]
enabled = false
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/onboardings"));
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.branch, "main");
        assert_eq!(config.load_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "data_dir = [").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AppConfig {
            load_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_docs_repo_rejected() {
        let mut config = AppConfig::default();
        config.remote.docs_repo = "not-a-repo".into();
        assert!(config.validate().is_err());

        config.remote.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ONBOARDCTX_DATA_DIR", "/tmp/onboard-data"),
            ("ONBOARDCTX_DOCS_REPO", "acme/docs"),
            ("ONBOARDCTX_REMOTE", "false"),
            ("GITHUB_TOKEN", "ghp_secret"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/onboard-data"));
        assert_eq!(config.remote.docs_repo, "acme/docs");
        assert!(!config.remote.enabled);
        assert_eq!(config.remote.github_token.as_deref(), Some("ghp_secret"));
    }

    #[test]
    fn debug_redacts_token() {
        let mut config = AppConfig::default();
        config.remote.github_token = Some("ghp_secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("default_token_budget"));
        assert!(toml_str.contains("CodeBoarding/GeneratedOnBoardings"));
    }
}
