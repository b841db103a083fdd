//! # Quarry Core Library
//!
//! This crate provides the indexing, search and ranking engine behind the
//! Quarry media library search. It turns a flat list of tagged records
//! (genre, artist, album, title) into a hierarchy and answers incremental
//! multi-term substring queries against it.
//!
//! ## Architecture
//!
//! - **Types** (`types`): Fields, keys, node handles and the text folder
//! - **Source** (`source`): The record source trait, JSON catalogs, notifications
//! - **Index** (`index`): The node forest built from a record source
//! - **Search** (`search`): Term parsing and the mask-threaded search walk
//! - **Rank** (`rank`): Two-pass ranking, truncation and display ordering
//! - **Library** (`library`): The session object owning index and settings
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust
//! use quarry_core::{Library, MediaRecord};
//!
//! let records = vec![
//!     MediaRecord::new("Classical", "Bach", "Suites", "No.1"),
//!     MediaRecord::new("Classical", "Bach", "Suites", "No.2"),
//! ];
//!
//! let library = Library::default();
//! library.rebuild(&records);
//!
//! let outcome = library.search_text("bach suites");
//! for result in &outcome.results {
//!     println!("{} ({} songs)", result.name, result.match_count());
//! }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod library;
pub mod rank;
pub mod search;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{QuarryError, Result};
pub use index::{Index, Node};
pub use library::{Library, SearchOutcome};
pub use rank::Ranked;
pub use search::{parse_terms, Crumb, SearchOptions, SearchResult, SearchTerms};
pub use source::{
    Catalog, ChannelSourceListener, MediaRecord, RecordSource, SourceEvent, SourceListener,
    UpdateLevel,
};
pub use types::{Field, IndexStats, Key, NodeId};
