use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_preamble")]
    pub preamble: String,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            preamble: default_preamble(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".kiro/post-mortems/confluence-pre-commit-errors.md")
}
fn default_preamble() -> String {
    "# Pre-Commit Build Errors - Confluence Reference".to_string()
}
fn default_lock_timeout_ms() -> u64 {
    5000
}

/// Where fix patterns come from. `None` means the bundled table.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PatternsConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub link_base: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default = "default_topic_suffix")]
    pub topic_suffix: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: None,
            command: None,
            args: Vec::new(),
            link_base: None,
            page_url: None,
            topic_suffix: default_topic_suffix(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_topic_suffix() -> String {
    "Pre-Commit".to_string()
}
fn default_limit() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl SearchConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

impl Config {
    /// Configuration used when no config file exists: bundled patterns,
    /// default document path, external search disabled.
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// Load the config file at `path`, falling back to [`Config::minimal`]
/// when the file does not exist.
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content).with_context(|| "Failed to parse config file")?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.store.path.as_os_str().is_empty() {
        anyhow::bail!("store.path must not be empty");
    }

    if config.search.limit < 1 {
        anyhow::bail!("search.limit must be >= 1");
    }
    if config.search.timeout_secs < 1 {
        anyhow::bail!("search.timeout_secs must be >= 1");
    }

    match config.search.provider.as_str() {
        "disabled" => {}
        "http" => {
            if config.search.endpoint.is_none() {
                anyhow::bail!("search.endpoint must be specified when provider is 'http'");
            }
        }
        "command" => {
            if config.search.command.is_none() {
                anyhow::bail!("search.command must be specified when provider is 'command'");
            }
        }
        other => anyhow::bail!(
            "Unknown search provider: '{}'. Must be disabled, http, or command.",
            other
        ),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.store.path, default_store_path());
        assert_eq!(cfg.search.provider, "disabled");
        assert_eq!(cfg.search.limit, 5);
        assert_eq!(cfg.search.topic_suffix, "Pre-Commit");
        assert!(cfg.patterns.path.is_none());
    }

    #[test]
    fn test_http_requires_endpoint() {
        let err = parse_config("[search]\nprovider = \"http\"\n").unwrap_err();
        assert!(err.to_string().contains("search.endpoint"));
    }

    #[test]
    fn test_command_requires_command() {
        let err = parse_config("[search]\nprovider = \"command\"\n").unwrap_err();
        assert!(err.to_string().contains("search.command"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse_config("[search]\nprovider = \"gopher\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown search provider"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(parse_config("[search]\nlimit = 0\n").is_err());
    }

    #[test]
    fn test_full_config() {
        let cfg = parse_config(
            r#"
[store]
path = "kb/errors.md"
lock_timeout_ms = 250

[patterns]
path = "kb/patterns.toml"

[search]
provider = "http"
endpoint = "https://wiki.example.com/rest/api/search"
link_base = "https://wiki.example.com/wiki"
limit = 3
timeout_secs = 10
"#,
        )
        .unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("kb/errors.md"));
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        assert_eq!(cfg.patterns.path, Some(PathBuf::from("kb/patterns.toml")));
        assert!(cfg.search.is_enabled());
        assert_eq!(cfg.search.limit, 3);
    }

    #[test]
    fn test_missing_file_falls_back_to_minimal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = load_or_minimal(&tmp.path().join("nope.toml")).unwrap();
        assert!(!cfg.search.is_enabled());
    }
}
