//! The long-lived search session.
//!
//! A `Library` owns one index and everything a caller needs to keep it in
//! step with a record source:
//!
//! - Rebuilds take the write lock for the whole Clear+Build, so a search
//!   never sees a half-built forest
//! - Searches take the read lock and return owned results
//! - A generation counter lets callers discard results computed against an
//!   index that has since been rebuilt or cleared
//! - [`Library::handle_event`] decides when a source notification warrants
//!   a rebuild

use crate::config::Config;
use crate::index::Index;
use crate::search::{SearchOptions, SearchResult, SearchTerms};
use crate::source::{RecordSource, SourceEvent, UpdateLevel};
use crate::types::IndexStats;
use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Results of one search, plus what was cut to fit the result cap.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Results in display order
    pub results: Vec<SearchResult>,

    /// Number of results dropped by truncation
    pub hidden: usize,

    /// Library generation the search ran against
    pub generation: u64,
}

impl SearchOutcome {
    /// Number of results shown
    pub fn shown(&self) -> usize {
        self.results.len()
    }

    /// Number of results found before truncation
    pub fn total(&self) -> usize {
        self.results.len() + self.hidden
    }
}

/// Owner of the index and its search settings.
pub struct Library {
    index: RwLock<Index>,
    options: RwLock<SearchOptions>,
    last_built: RwLock<Option<DateTime<Utc>>>,
    generation: AtomicU64,
}

impl Default for Library {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}

impl Library {
    /// Create a library with an absent index.
    pub fn new(options: SearchOptions) -> Self {
        Library {
            index: RwLock::new(Index::new()),
            options: RwLock::new(options),
            last_built: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Create a library using the search settings from a configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.search_options())
    }

    /// Whether the index is built and queryable.
    pub fn is_valid(&self) -> bool {
        self.index.read().is_valid()
    }

    /// Current generation; bumped by every rebuild and clear.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether `outcome` was computed against the current index.
    pub fn is_current(&self, outcome: &SearchOutcome) -> bool {
        outcome.generation == self.generation()
    }

    /// Read access to the index. Rebuilds wait until the guard is dropped.
    pub fn index(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read()
    }

    /// Current search options.
    pub fn options(&self) -> SearchOptions {
        self.options.read().clone()
    }

    /// Change the result cap; values below one are raised to one.
    pub fn set_max_results(&self, max_results: usize) {
        self.options.write().max_results = max_results.max(1);
    }

    /// Discard the index and build a new one from `source`.
    #[instrument(skip(self, source))]
    pub fn rebuild<S: RecordSource + ?Sized>(&self, source: &S) {
        let start = Instant::now();

        let mut index = self.index.write();
        index.build(source);
        *self.last_built.write() = Some(Utc::now());
        self.generation.fetch_add(1, Ordering::Release);

        info!(
            records = index.record_count(),
            nodes = index.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Index rebuilt"
        );
    }

    /// Discard the index. Searches return nothing until the next rebuild.
    pub fn clear(&self) {
        let mut index = self.index.write();
        index.clear();
        self.generation.fetch_add(1, Ordering::Release);
        info!("Index cleared");
    }

    /// Rebuild if the source has settled, otherwise clear.
    pub fn refresh<S: RecordSource + ?Sized>(&self, source: &S) {
        if source.is_settled() {
            self.rebuild(source);
        } else {
            debug!("Source still settling, clearing index");
            self.clear();
        }
    }

    /// React to a source notification.
    ///
    /// Returns true when the index was rebuilt or cleared.
    pub fn handle_event<S: RecordSource + ?Sized>(&self, event: SourceEvent, source: &S) -> bool {
        debug!(event = %event, valid = self.is_valid(), "Source event");

        let refresh = match event {
            SourceEvent::AddComplete => {
                !source.add_in_progress() && !self.is_valid() && !source.update_pending()
            }
            SourceEvent::ScanComplete => {
                source.is_settled() && !self.is_valid() && !source.update_pending()
            }
            SourceEvent::Updated(level) => {
                !self.is_valid() || !source.is_settled() || level >= UpdateLevel::Metadata
            }
        };

        if refresh {
            self.refresh(source);
        }
        refresh
    }

    /// Search the current index.
    #[instrument(skip(self, terms))]
    pub fn search(&self, terms: &SearchTerms) -> SearchOutcome {
        let start = Instant::now();
        let options = self.options();

        let index = self.index.read();
        let generation = self.generation();
        let ranked = index.search(terms, &options);

        let results: Vec<SearchResult> = ranked
            .items
            .iter()
            .map(|&id| SearchResult::from_node(&index, id))
            .collect();

        debug!(
            terms = terms.len(),
            shown = results.len(),
            hidden = ranked.hidden,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Search complete"
        );

        SearchOutcome {
            results,
            hidden: ranked.hidden,
            generation,
        }
    }

    /// Tokenize `input` and search.
    pub fn search_text(&self, input: &str) -> SearchOutcome {
        self.search(&SearchTerms::parse(input))
    }

    /// Get current index statistics.
    pub fn stats(&self) -> IndexStats {
        let index = self.index.read();
        IndexStats {
            valid: index.is_valid(),
            record_count: index.record_count(),
            nodes_per_field: index.nodes_per_field(),
            last_built: *self.last_built.read(),
            generation: self.generation(),
        }
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("valid", &self.is_valid())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MediaRecord;
    use crate::types::Field;
    use std::cell::Cell;

    fn make_test_records() -> Vec<MediaRecord> {
        vec![
            MediaRecord::new("Classical", "Bach", "Suites", "No.1"),
            MediaRecord::new("Classical", "Bach", "Suites", "No.2"),
            MediaRecord::new("Classical", "Beethoven", "Sonatas", "Moonlight"),
        ]
    }

    /// A source whose settle flags can be flipped by the test.
    struct FakeSource {
        records: Vec<MediaRecord>,
        adding: Cell<bool>,
        scanning: Cell<bool>,
        pending: Cell<bool>,
    }

    impl FakeSource {
        fn new() -> Self {
            FakeSource {
                records: make_test_records(),
                adding: Cell::new(false),
                scanning: Cell::new(false),
                pending: Cell::new(false),
            }
        }
    }

    impl RecordSource for FakeSource {
        fn record_count(&self) -> usize {
            self.records.len()
        }

        fn field(&self, record: usize, field: Field) -> Option<&str> {
            self.records.field(record, field)
        }

        fn add_in_progress(&self) -> bool {
            self.adding.get()
        }

        fn scan_in_progress(&self) -> bool {
            self.scanning.get()
        }

        fn update_pending(&self) -> bool {
            self.pending.get()
        }
    }

    #[test]
    fn test_search_before_build_is_empty() {
        let library = Library::default();
        let outcome = library.search_text("bach");
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.hidden, 0);
        assert_eq!(outcome.total(), 0);
    }

    #[test]
    fn test_rebuild_and_search() {
        let library = Library::default();
        library.rebuild(&make_test_records());

        // Bach has a single album, so the album stands in for the artist
        let outcome = library.search_text("Bach");
        let names: Vec<&str> = outcome.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Suites", "No.1", "No.2"]);
        let counts: Vec<usize> = outcome.results.iter().map(|r| r.match_count()).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert!(library.is_current(&outcome));
    }

    #[test]
    fn test_generation_marks_stale_results() {
        let library = Library::default();
        library.rebuild(&make_test_records());
        let outcome = library.search_text("bach");

        library.rebuild(&make_test_records());
        assert!(!library.is_current(&outcome));

        let fresh = library.search_text("bach");
        library.clear();
        assert!(!library.is_current(&fresh));
        assert!(!library.is_valid());
    }

    #[test]
    fn test_set_max_results() {
        let library = Library::default();
        library.rebuild(&make_test_records());

        library.set_max_results(1);
        let outcome = library.search_text("");
        assert_eq!(outcome.shown(), 1);
        assert!(outcome.hidden > 0);

        library.set_max_results(0);
        assert_eq!(library.options().max_results, 1);
    }

    #[test]
    fn test_refresh_clears_while_unsettled() {
        let library = Library::default();
        let source = FakeSource::new();
        library.rebuild(&source);

        source.scanning.set(true);
        library.refresh(&source);
        assert!(!library.is_valid());

        source.scanning.set(false);
        library.refresh(&source);
        assert!(library.is_valid());
    }

    #[test]
    fn test_add_complete_builds_invalid_index() {
        let library = Library::default();
        let source = FakeSource::new();

        source.adding.set(true);
        assert!(!library.handle_event(SourceEvent::AddComplete, &source));

        source.adding.set(false);
        source.pending.set(true);
        assert!(!library.handle_event(SourceEvent::AddComplete, &source));

        source.pending.set(false);
        assert!(library.handle_event(SourceEvent::AddComplete, &source));
        assert!(library.is_valid());

        // already valid: nothing to do
        assert!(!library.handle_event(SourceEvent::AddComplete, &source));
    }

    #[test]
    fn test_scan_complete_waits_for_scan() {
        let library = Library::default();
        let source = FakeSource::new();

        source.scanning.set(true);
        assert!(!library.handle_event(SourceEvent::ScanComplete, &source));

        source.scanning.set(false);
        assert!(library.handle_event(SourceEvent::ScanComplete, &source));
        assert!(library.is_valid());
    }

    #[test]
    fn test_update_levels() {
        let library = Library::default();
        let source = FakeSource::new();
        library.rebuild(&source);
        let generation = library.generation();

        assert!(!library.handle_event(SourceEvent::Updated(UpdateLevel::Selection), &source));
        assert_eq!(library.generation(), generation);

        assert!(library.handle_event(SourceEvent::Updated(UpdateLevel::Metadata), &source));
        assert!(library.handle_event(SourceEvent::Updated(UpdateLevel::Structure), &source));
        assert_eq!(library.generation(), generation + 2);

        // an update while adding drops the index until the add settles
        source.adding.set(true);
        assert!(library.handle_event(SourceEvent::Updated(UpdateLevel::Selection), &source));
        assert!(!library.is_valid());
    }

    #[test]
    fn test_stats() {
        let library = Library::default();
        assert!(!library.stats().valid);
        assert!(library.stats().last_built.is_none());

        library.rebuild(&make_test_records());
        let stats = library.stats();
        assert!(stats.valid);
        assert_eq!(stats.record_count, 3);
        assert_eq!(stats.nodes(Field::Title), 3);
        assert_eq!(stats.total_nodes(), 1 + 2 + 2 + 3);
        assert!(stats.last_built.is_some());
        assert_eq!(stats.generation, 1);
    }
}
