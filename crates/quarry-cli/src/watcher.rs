//! Catalog change monitoring.
//!
//! The watcher subscribes to filesystem notifications for the directory
//! holding the catalog and reports every event touching the catalog file as
//! a structural update. It does not reload anything itself; the owner
//! reloads once changes have settled.

use anyhow::Context;
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quarry_core::{SourceEvent, SourceListener, UpdateLevel};
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Watches a catalog file for changes.
pub struct CatalogWatcher {
    path: PathBuf,
}

impl CatalogWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CatalogWatcher { path: path.into() }
    }

    /// Start watching. Monitoring continues until the handle is dropped.
    ///
    /// The parent directory is watched rather than the file itself, so a
    /// catalog replaced by rename or recreated after deletion is still seen.
    pub fn spawn(self, listener: Arc<dyn SourceListener>) -> anyhow::Result<WatchHandle> {
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .with_context(|| format!("Catalog path {} names no file", self.path.display()))?;
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
            Ok(event) => {
                if touches_catalog(&event, &file_name) {
                    debug!(kind = ?event.kind, "Catalog changed");
                    listener.on_event(SourceEvent::Updated(UpdateLevel::Structure));
                }
            }
            Err(e) => warn!(error = %e, "Catalog watch error"),
        })
        .context("Failed to create catalog watcher")?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", directory.display()))?;

        info!(path = %self.path.display(), "Watching catalog");

        Ok(WatchHandle { _watcher: watcher })
    }
}

/// Whether `event` may have changed the catalog file.
///
/// Reads are ignored. An event without paths means the backend lost track
/// and the directory must be rescanned, which may include the catalog.
fn touches_catalog(event: &Event, file_name: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.is_empty()
        || event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

/// Handle for a running catalog watcher.
///
/// Dropping the handle stops the watcher.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
}
