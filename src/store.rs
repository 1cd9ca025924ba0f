//! Append-only knowledge base document.
//!
//! [`KnowledgeStore`] owns a single Markdown file of Records (see
//! [`crate::format`]). Records are located by scanning for their header
//! line; there is no separate index. The file is only ever extended:
//! existing bytes are never rewritten, reordered, or removed.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::format;
use crate::lock::FileLock;
use crate::models::RecordFields;

#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    path: PathBuf,
    preamble: String,
    lock_timeout: Duration,
}

/// Scanner state while extracting one Record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Seeking,
    InTargetSection,
}

impl KnowledgeStore {
    pub fn open(path: impl Into<PathBuf>, preamble: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            preamble: preamble.into(),
            lock_timeout: Duration::from_millis(5000),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::open(&config.store.path, &config.store.preamble)
            .with_lock_timeout(Duration::from_millis(config.store.lock_timeout_ms))
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the text of the Record for `code`, or `None` when the document
    /// does not exist or has no such Record.
    ///
    /// The Record runs from its header line up to, not including, the next
    /// header for a *different* code. A second header for the same code does
    /// not end the section: it is folded into the first Record's text.
    pub fn find(&self, code: &str) -> Result<Option<String>> {
        let Some(content) = self.read()? else {
            debug!(path = %self.path.display(), "knowledge base does not exist yet");
            return Ok(None);
        };
        Ok(extract_section(&content, code))
    }

    /// Append a new Record for `code` unless one already exists.
    ///
    /// Returns `true` if a Record was written. The existence check and the
    /// write run under an exclusive lock, so cooperating processes cannot
    /// both add the same code.
    pub fn append(&self, code: &str, fields: &RecordFields) -> Result<bool> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }

        let _lock = FileLock::acquire(&FileLock::path_for(&self.path), self.lock_timeout)?;

        if self.find(code)?.is_some() {
            debug!(code, "record already present, skipping append");
            return Ok(false);
        }

        let mut block = String::new();
        if !self.path.exists() {
            block.push_str(&format::document_preamble(&self.preamble));
        }
        block.push_str(&format::render_record(code, fields));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open knowledge base: {}", self.path.display()))?;
        file.write_all(block.as_bytes())
            .with_context(|| format!("Failed to write knowledge base: {}", self.path.display()))?;
        file.sync_all()?;

        info!(code, path = %self.path.display(), "recorded new error");
        Ok(true)
    }

    /// Codes of every Record header, in document order.
    pub fn list_codes(&self) -> Result<Vec<String>> {
        let Some(content) = self.read()? else {
            return Ok(Vec::new());
        };
        Ok(content
            .lines()
            .filter_map(format::header_code)
            .map(str::to_string)
            .collect())
    }

    fn read(&self) -> Result<Option<String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read knowledge base: {}", self.path.display())),
        }
    }
}

fn extract_section(content: &str, code: &str) -> Option<String> {
    let mut state = ScanState::Seeking;
    let mut lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        match state {
            ScanState::Seeking => {
                if format::is_header_for(line, code) {
                    state = ScanState::InTargetSection;
                    lines.push(line);
                }
            }
            ScanState::InTargetSection => {
                if format::is_header(line) && !format::is_header_for(line, code) {
                    break;
                }
                lines.push(line);
            }
        }
    }

    match state {
        ScanState::Seeking => None,
        ScanState::InTargetSection => Some(lines.join("\n")),
    }
}
