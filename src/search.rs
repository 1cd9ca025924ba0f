//! External knowledge search.
//!
//! The collaborator is consumed only as "send a query string, receive zero
//! or more `{title, link}` results, or a failure". Three providers exist:
//!
//! | Config Value | Provider |
//! |-------------|----------|
//! | `"disabled"` | [`DisabledSearch`] |
//! | `"http"` | [`HttpSearch`]: `GET {endpoint}?query=..&limit=..` |
//! | `"command"` | [`CommandSearch`]: runs a CLI and reads JSON from stdout |
//!
//! Both live providers understand the Confluence search shape
//! (`results[].title`, `results[]._links.webui`) as well as a flat
//! `results[].link` / `results[].url` form.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::SearchConfig;
use crate::models::SearchResult;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("external search is disabled")]
    Disabled,
    #[error("external search timed out after {0:?}")]
    Timeout(Duration),
    #[error("external search transport error: {0}")]
    Transport(String),
    #[error("external search returned status {0}")]
    Status(i32),
    #[error("external search returned malformed data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ExternalSearch: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Build the provider selected by `[search].provider`.
///
/// Config validation guarantees the provider-specific fields are present.
pub fn create_search(config: &SearchConfig) -> anyhow::Result<Box<dyn ExternalSearch>> {
    if !config.is_enabled() {
        return Ok(Box::new(DisabledSearch));
    }
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledSearch)),
        "http" => Ok(Box::new(HttpSearch::new(config)?)),
        "command" => Ok(Box::new(CommandSearch::new(config)?)),
        other => anyhow::bail!("Unknown search provider: {}", other),
    }
}

pub struct DisabledSearch;

#[async_trait]
impl ExternalSearch for DisabledSearch {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        Err(SearchError::Disabled)
    }
}

// ============ HTTP ============

pub struct HttpSearch {
    client: reqwest::Client,
    endpoint: String,
    link_base: Option<String>,
    timeout: Duration,
}

impl HttpSearch {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("search.endpoint required for http provider"))?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            link_base: config.link_base.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl ExternalSearch for HttpSearch {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let limit_param = limit.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("limit", limit_param.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(i32::from(status.as_u16())));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;
        parse_results(&json, self.link_base.as_deref(), limit)
    }
}

impl HttpSearch {
    fn transport_error(&self, e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout(self.timeout)
        } else {
            SearchError::Transport(e.to_string())
        }
    }
}

// ============ Command ============

/// Runs an external CLI (for example an MCP client) and parses its stdout.
///
/// `{query}` and `{limit}` in the configured args are substituted per call.
pub struct CommandSearch {
    program: String,
    args: Vec<String>,
    link_base: Option<String>,
    timeout: Duration,
}

impl CommandSearch {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let program = config
            .command
            .clone()
            .ok_or_else(|| anyhow::anyhow!("search.command required for command provider"))?;
        Ok(Self {
            program,
            args: config.args.clone(),
            link_base: config.link_base.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn expand_args(&self, query: &str, limit: usize) -> Vec<String> {
        let limit = limit.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{query}", query).replace("{limit}", &limit))
            .collect()
    }
}

#[async_trait]
impl ExternalSearch for CommandSearch {
    fn name(&self) -> &str {
        "command"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(self.expand_args(query, limit))
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SearchError::Timeout(self.timeout))?
            .map_err(|e| SearchError::Transport(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(SearchError::Status(output.status.code().unwrap_or(-1)));
        }

        let json: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| SearchError::Malformed(e.to_string()))?;
        parse_results(&json, self.link_base.as_deref(), limit)
    }
}

// ============ Response parsing ============

/// Parse a `{"results": [...]}` payload into at most `limit` results.
pub fn parse_results(
    json: &Value,
    link_base: Option<&str>,
    limit: usize,
) -> Result<Vec<SearchResult>, SearchError> {
    let items = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| SearchError::Malformed("missing results array".to_string()))?;

    Ok(items
        .iter()
        .take(limit)
        .map(|item| SearchResult {
            title: item
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("N/A")
                .to_string(),
            link: item_link(item, link_base),
        })
        .collect())
}

fn item_link(item: &Value, link_base: Option<&str>) -> String {
    if let Some(link) = ["link", "url"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
    {
        return link.to_string();
    }

    let webui = item
        .get("_links")
        .and_then(|l| l.get("webui"))
        .and_then(Value::as_str)
        .unwrap_or("");
    match link_base {
        Some(base) if !webui.starts_with("http") => {
            format!("{}{}", base.trim_end_matches('/'), webui)
        }
        _ => webui.to_string(),
    }
}
