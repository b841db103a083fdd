//! Record source interface.
//!
//! The index never owns the media library; it reads it through the
//! [`RecordSource`] trait. A source supplies an ordered sequence of records
//! addressable by integer index, reports whether it is still settling
//! (adding or scanning), and notifies its owner through a
//! [`SourceListener`] when a rebuild may be due.
//!
//! ## Catalog files
//!
//! [`Catalog`] is the file-backed source used by the CLI. It reads a JSON
//! file that is either a bare array of records or an object with a
//! `records` array:
//!
//! ```json
//! [
//!   { "genre": "Classical", "artist": "Bach", "album": "Suites", "title": "No.1" },
//!   { "artist": "Beethoven", "album": "Sonatas", "title": "Moonlight" }
//! ]
//! ```

use crate::error::{QuarryError, Result};
use crate::types::Field;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single library entry with four optional tag fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaRecord {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
}

impl MediaRecord {
    /// Create a record with every field set.
    pub fn new(
        genre: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        MediaRecord {
            genre: Some(genre.into()),
            artist: Some(artist.into()),
            album: Some(album.into()),
            title: Some(title.into()),
        }
    }

    /// Set one field, builder style.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            Field::Genre => self.genre = value,
            Field::Artist => self.artist = value,
            Field::Album => self.album = value,
            Field::Title => self.title = value,
        }
        self
    }

    /// Value of a field, or `None` when it is absent or blank.
    pub fn field(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Genre => self.genre.as_deref(),
            Field::Artist => self.artist.as_deref(),
            Field::Album => self.album.as_deref(),
            Field::Title => self.title.as_deref(),
        }?;

        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Ordered, index-addressable supply of records.
///
/// Implementations may be filled asynchronously; the settle flags tell the
/// library whether the current contents are worth indexing yet.
pub trait RecordSource {
    /// Number of records currently available
    fn record_count(&self) -> usize;

    /// Value of `field` for the record at `record`, `None` if absent or blank
    fn field(&self, record: usize, field: Field) -> Option<&str>;

    /// True while records are still being added
    fn add_in_progress(&self) -> bool {
        false
    }

    /// True while record metadata is still being scanned
    fn scan_in_progress(&self) -> bool {
        false
    }

    /// True when the source has queued a further update notification
    fn update_pending(&self) -> bool {
        false
    }

    /// True when neither an add nor a scan is in progress
    fn is_settled(&self) -> bool {
        !self.add_in_progress() && !self.scan_in_progress()
    }
}

impl RecordSource for [MediaRecord] {
    fn record_count(&self) -> usize {
        self.len()
    }

    fn field(&self, record: usize, field: Field) -> Option<&str> {
        self.get(record).and_then(|r| r.field(field))
    }
}

impl RecordSource for Vec<MediaRecord> {
    fn record_count(&self) -> usize {
        self.len()
    }

    fn field(&self, record: usize, field: Field) -> Option<&str> {
        self.as_slice().field(record, field)
    }
}

/// Records loaded from a JSON catalog file.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    records: Vec<MediaRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<MediaRecord>),
    Wrapped { records: Vec<MediaRecord> },
}

impl Catalog {
    /// Load a catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = read_records(&path)?;
        info!(path = %path.display(), records = records.len(), "Loaded catalog");
        Ok(Catalog { path, records })
    }

    /// Re-read the catalog file, replacing the current records.
    ///
    /// On failure the previous records are kept.
    pub fn reload(&mut self) -> Result<()> {
        let records = read_records(&self.path)?;
        debug!(
            path = %self.path.display(),
            before = self.records.len(),
            after = records.len(),
            "Reloaded catalog"
        );
        self.records = records;
        Ok(())
    }

    /// Path the catalog was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write records to a catalog file as a pretty-printed JSON array.
    pub fn write(path: impl AsRef<Path>, records: &[MediaRecord]) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(records)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl RecordSource for Catalog {
    fn record_count(&self) -> usize {
        self.records.len()
    }

    fn field(&self, record: usize, field: Field) -> Option<&str> {
        self.records.as_slice().field(record, field)
    }
}

fn read_records(path: &Path) -> Result<Vec<MediaRecord>> {
    if !path.exists() {
        return Err(QuarryError::CatalogNotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path)?;
    let file: CatalogFile = serde_json::from_str(&contents)
        .map_err(|e| QuarryError::catalog_parse(path, e.to_string()))?;

    Ok(match file {
        CatalogFile::List(records) => records,
        CatalogFile::Wrapped { records } => records,
    })
}

/// How much of the source changed in an update notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateLevel {
    /// Only selection state changed; records are untouched
    Selection,
    /// Tags of existing records changed
    Metadata,
    /// Records were added, removed or reordered
    Structure,
}

/// Notification from a record source to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// A batch of additions finished
    AddComplete,
    /// A metadata scan finished
    ScanComplete,
    /// The source contents changed
    Updated(UpdateLevel),
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceEvent::AddComplete => write!(f, "add_complete"),
            SourceEvent::ScanComplete => write!(f, "scan_complete"),
            SourceEvent::Updated(level) => write!(f, "updated({:?})", level),
        }
    }
}

/// Receiver of source notifications.
///
/// Sources may fill themselves from background threads, so listeners must
/// be shareable across threads.
pub trait SourceListener: Send + Sync {
    fn on_event(&self, event: SourceEvent);
}

/// A listener that forwards events over a channel to the owning thread.
pub struct ChannelSourceListener {
    sender: crossbeam_channel::Sender<SourceEvent>,
}

impl ChannelSourceListener {
    /// Create a new channel-based listener
    pub fn new() -> (Self, crossbeam_channel::Receiver<SourceEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (ChannelSourceListener { sender }, receiver)
    }
}

impl Default for ChannelSourceListener {
    fn default() -> Self {
        Self::new().0
    }
}

impl SourceListener for ChannelSourceListener {
    fn on_event(&self, event: SourceEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_blank_fields_are_absent() {
        let record = MediaRecord::default()
            .with(Field::Artist, "Bach")
            .with(Field::Album, "   ")
            .with(Field::Title, "");

        assert_eq!(record.field(Field::Artist), Some("Bach"));
        assert_eq!(record.field(Field::Album), None);
        assert_eq!(record.field(Field::Title), None);
        assert_eq!(record.field(Field::Genre), None);
    }

    #[test]
    fn test_slice_source() {
        let records = vec![
            MediaRecord::new("Classical", "Bach", "Suites", "No.1"),
            MediaRecord::default().with(Field::Title, "Untitled"),
        ];

        assert_eq!(records.record_count(), 2);
        assert_eq!(records.field(0, Field::Album), Some("Suites"));
        assert_eq!(records.field(1, Field::Artist), None);
        assert_eq!(records.field(7, Field::Title), None);
        assert!(records.is_settled());
    }

    #[test]
    fn test_catalog_load_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        fs::write(
            &path,
            r#"[{"artist": "Bach", "title": "No.1"}, {"genre": "Rock"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.field(0, Field::Artist), Some("Bach"));
        assert_eq!(catalog.field(1, Field::Genre), Some("Rock"));
        assert_eq!(catalog.path(), path.as_path());
    }

    #[test]
    fn test_catalog_load_wrapped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        fs::write(&path, r#"{"records": [{"album": "Sonatas"}]}"#).unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.field(0, Field::Album), Some("Sonatas"));
    }

    #[test]
    fn test_catalog_write_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("library.json");

        Catalog::write(&path, &[MediaRecord::new("Jazz", "Monk", "Misterioso", "Blues Five Spot")])
            .unwrap();
        let mut catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 1);

        Catalog::write(&path, &[]).unwrap();
        catalog.reload().unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_catalog_missing() {
        let temp_dir = TempDir::new().unwrap();
        let err = Catalog::load(temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, QuarryError::CatalogNotFound { .. }));
    }

    #[test]
    fn test_catalog_malformed_keeps_records_on_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.json");
        fs::write(&path, r#"[{"artist": "Bach"}]"#).unwrap();
        let mut catalog = Catalog::load(&path).unwrap();

        fs::write(&path, "[{").unwrap();
        let err = catalog.reload().unwrap_err();
        assert!(matches!(err, QuarryError::CatalogParse { .. }));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_level_order() {
        assert!(UpdateLevel::Selection < UpdateLevel::Metadata);
        assert!(UpdateLevel::Metadata < UpdateLevel::Structure);
    }

    #[test]
    fn test_channel_listener() {
        let (listener, receiver) = ChannelSourceListener::new();
        listener.on_event(SourceEvent::ScanComplete);
        listener.on_event(SourceEvent::Updated(UpdateLevel::Structure));

        assert_eq!(receiver.try_recv().unwrap(), SourceEvent::ScanComplete);
        assert_eq!(
            receiver.try_recv().unwrap(),
            SourceEvent::Updated(UpdateLevel::Structure)
        );
    }
}
