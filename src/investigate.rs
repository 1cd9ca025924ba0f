//! One end-to-end inquiry for a single error code.
//!
//! The [`Investigator`] reads the local knowledge base, the fix-pattern
//! table, and the external search collaborator in sequence, then records
//! the error locally if it has never been seen. It holds no state between
//! calls; the only lasting effect is at most one new Record per call.

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::format::or_unknown;
use crate::models::{FixPattern, Inquiry, InvestigationResult, RecordFields, SearchResult};
use crate::patterns::FixPatternTable;
use crate::search::{ExternalSearch, SearchError};
use crate::store::KnowledgeStore;

pub struct Investigator<'a> {
    store: &'a KnowledgeStore,
    patterns: &'a FixPatternTable,
    search: &'a dyn ExternalSearch,
    topic_suffix: String,
    limit: usize,
}

impl<'a> Investigator<'a> {
    pub fn new(
        store: &'a KnowledgeStore,
        patterns: &'a FixPatternTable,
        search: &'a dyn ExternalSearch,
        search_config: &SearchConfig,
    ) -> Self {
        Self {
            store,
            patterns,
            search,
            topic_suffix: search_config.topic_suffix.clone(),
            limit: search_config.limit,
        }
    }

    pub async fn investigate(&self, inquiry: &Inquiry) -> Result<InvestigationResult> {
        let code = inquiry.code.trim();
        if code.is_empty() || code.contains(['\n', '\r']) {
            bail!("error code must be a single non-empty line");
        }

        let lookup = self.store.find(code);
        if let Err(e) = &lookup {
            warn!(code, error = %e, "local knowledge base unreadable");
        }
        let store_readable = lookup.is_ok();
        let local_record = lookup.unwrap_or(None);
        debug!(code, found = local_record.is_some(), "local lookup");

        let fix_pattern = self.patterns.lookup(code).cloned();

        let query = format!("{} {}", code, self.topic_suffix);
        let external_results = self.search_or_empty(&query).await;

        // An unreadable document cannot be checked for duplicates, so it is
        // never appended to.
        let newly_recorded = if local_record.is_none() && store_readable {
            let fields = synthesize_record(inquiry, fix_pattern.as_ref());
            self.store.append(code, &fields).unwrap_or_else(|e| {
                warn!(code, error = %e, "failed to record error");
                false
            })
        } else {
            false
        };

        Ok(InvestigationResult {
            code: code.to_string(),
            local_record,
            fix_pattern,
            external_results,
            newly_recorded,
        })
    }

    /// The single place where external search failures become "no results".
    async fn search_or_empty(&self, query: &str) -> Vec<SearchResult> {
        match self.search.search(query, self.limit).await {
            Ok(results) => results,
            Err(SearchError::Disabled) => {
                debug!("external search disabled");
                Vec::new()
            }
            Err(e) => {
                warn!(provider = self.search.name(), error = %e, "external search failed");
                Vec::new()
            }
        }
    }
}

/// Build the Record written for a never-seen code from the pattern (when
/// known) and the caller's location details.
pub fn synthesize_record(inquiry: &Inquiry, pattern: Option<&FixPattern>) -> RecordFields {
    let location = |value: &Option<String>| Some(or_unknown(value.as_deref()));

    RecordFields {
        title: pattern.map(|p| p.title.clone()),
        message: None,
        service: location(&inquiry.service),
        file: location(&inquiry.file),
        line: location(&inquiry.line),
        date: Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
        root_cause: pattern.map(|p| p.root_cause.clone()),
        fix: pattern.map(|p| p.fix.clone()),
        example_before: pattern.and_then(|p| p.example_before.clone()),
        example_after: pattern.and_then(|p| p.example_after.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StubSearch {
        outcome: fn() -> Result<Vec<SearchResult>, SearchError>,
        calls: AtomicUsize,
        last_query: Mutex<Option<(String, usize)>>,
    }

    impl StubSearch {
        fn new(outcome: fn() -> Result<Vec<SearchResult>, SearchError>) -> Self {
            Self {
                outcome,
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ExternalSearch for StubSearch {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(
            &self,
            query: &str,
            limit: usize,
        ) -> Result<Vec<SearchResult>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some((query.to_string(), limit));
            (self.outcome)()
        }
    }

    fn one_hit() -> Result<Vec<SearchResult>, SearchError> {
        Ok(vec![SearchResult {
            title: "Prior CS9999 writeup".to_string(),
            link: "https://wiki.example.com/pages/9".to_string(),
        }])
    }

    fn timeout() -> Result<Vec<SearchResult>, SearchError> {
        Err(SearchError::Timeout(Duration::from_secs(30)))
    }

    fn store_in(tmp: &TempDir) -> KnowledgeStore {
        KnowledgeStore::open(tmp.path().join("errors.md"), "# Errors")
    }

    fn inquiry(code: &str) -> Inquiry {
        Inquiry {
            code: code.to_string(),
            service: Some("Svc".to_string()),
            file: Some("a.cs".to_string()),
            line: Some("10".to_string()),
        }
    }

    #[tokio::test]
    async fn test_first_sighting_records_error() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::bundled().unwrap();
        let search = StubSearch::new(one_hit);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        let result = inv.investigate(&inquiry("CS9999")).await.unwrap();

        assert_eq!(result.local_record, None);
        assert_eq!(result.fix_pattern, None);
        assert_eq!(result.external_results.len(), 1);
        assert!(result.newly_recorded);
        assert_eq!(
            *search.last_query.lock().unwrap(),
            Some(("CS9999 Pre-Commit".to_string(), 5))
        );

        let record = store.find("CS9999").unwrap().unwrap();
        assert!(record.contains("**Service**: Svc"));
        assert!(record.contains("**File**: a.cs"));
        assert!(record.contains("**Line**: 10"));
        assert_eq!(store.list_codes().unwrap(), vec!["CS9999"]);
    }

    #[tokio::test]
    async fn test_repeat_sighting_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::bundled().unwrap();
        let search = StubSearch::new(one_hit);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        inv.investigate(&inquiry("CS9999")).await.unwrap();
        let written = store.find("CS9999").unwrap();
        let bytes_before = std::fs::read(store.path()).unwrap();

        let again = inv.investigate(&inquiry("CS9999")).await.unwrap();

        assert!(!again.newly_recorded);
        assert_eq!(again.local_record, written);
        assert_eq!(std::fs::read(store.path()).unwrap(), bytes_before);
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_known_pattern_feeds_new_record() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::bundled().unwrap();
        let search = StubSearch::new(timeout);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        let result = inv.investigate(&inquiry("CS0161")).await.unwrap();

        let pattern = result.fix_pattern.unwrap();
        assert_eq!(pattern.title, "Not all code paths return a value");
        assert!(result.newly_recorded);

        let record = store.find("CS0161").unwrap().unwrap();
        assert!(record.starts_with("## CS0161 - Not all code paths return a value"));
        assert!(record.contains(&format!("**Root Cause**: {}", pattern.root_cause)));
        assert!(record.contains(&format!("**Quick Fix**: {}", pattern.fix)));
        assert!(record.contains("return \"default\";  // Add default return"));
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::default();
        let search = StubSearch::new(timeout);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        let result = inv.investigate(&inquiry("E42")).await.unwrap();
        assert!(result.external_results.is_empty());
        assert!(result.newly_recorded);
    }

    #[tokio::test]
    async fn test_empty_code_rejected_without_side_effects() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::default();
        let search = StubSearch::new(one_hit);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        assert!(inv.investigate(&inquiry("   ")).await.is_err());
        assert!(!store.path().exists());
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreadable_store_degrades() {
        let tmp = TempDir::new().unwrap();
        // A directory where the document should be makes every read fail.
        let store = KnowledgeStore::open(tmp.path(), "# Errors");
        let patterns = FixPatternTable::bundled().unwrap();
        let search = StubSearch::new(one_hit);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        let result = inv.investigate(&inquiry("CS0161")).await.unwrap();
        assert!(result.local_record.is_none());
        assert!(result.fix_pattern.is_some());
        assert_eq!(result.external_results.len(), 1);
        assert!(!result.newly_recorded);
    }

    #[tokio::test]
    async fn test_multiline_code_rejected() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let patterns = FixPatternTable::default();
        let search = StubSearch::new(one_hit);
        let inv = Investigator::new(&store, &patterns, &search, &SearchConfig::default());

        assert!(inv.investigate(&inquiry("E1\n## E2")).await.is_err());
        assert!(inv.investigate(&inquiry("E1\r\nE2")).await.is_err());
        assert!(!store.path().exists());
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_synthesize_without_pattern_uses_placeholders() {
        let fields = synthesize_record(
            &Inquiry {
                code: "E1".to_string(),
                service: None,
                file: Some(String::new()),
                line: None,
            },
            None,
        );
        assert_eq!(fields.service.as_deref(), Some("Unknown"));
        assert_eq!(fields.file.as_deref(), Some("Unknown"));
        assert!(fields.title.is_none());
        assert!(fields.root_cause.is_none());
        assert!(fields.date.is_some());
    }
}
