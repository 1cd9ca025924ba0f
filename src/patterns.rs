//! Static table of known fix patterns.
//!
//! The table is loaded once at startup, either from the file named by
//! `[patterns].path` or from the bundled `patterns/default.toml`, and is
//! read-only afterwards.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::models::FixPattern;

const BUNDLED_PATTERNS: &str = include_str!("../patterns/default.toml");

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    pattern: Vec<FixPattern>,
}

#[derive(Debug, Clone, Default)]
pub struct FixPatternTable {
    patterns: BTreeMap<String, FixPattern>,
}

impl FixPatternTable {
    pub fn load(config: &Config) -> Result<Self> {
        match &config.patterns.path {
            Some(path) => Self::from_file(path),
            None => Self::bundled(),
        }
    }

    pub fn bundled() -> Result<Self> {
        Self::from_toml_str(BUNDLED_PATTERNS).context("Bundled fix patterns are invalid")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fix patterns: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse fix patterns: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PatternFile = toml::from_str(content)?;
        let mut patterns = BTreeMap::new();
        for pattern in file.pattern {
            if pattern.code.trim().is_empty() {
                bail!("fix pattern with empty code");
            }
            let code = pattern.code.clone();
            if patterns.insert(code.clone(), pattern).is_some() {
                bail!("duplicate fix pattern for code '{}'", code);
            }
        }
        Ok(Self { patterns })
    }

    /// Pattern for `code`; `None` when the code is unknown.
    pub fn lookup(&self, code: &str) -> Option<&FixPattern> {
        self.patterns.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixPattern> {
        self.patterns.values()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
