//! Core data types for Quarry.
//!
//! This module defines the vocabulary shared by the index, the search walk
//! and the ranker:
//!
//! - **Field**: the four tag fields, in hierarchy and display order
//! - **Key**: the `(field, name)` pair that identifies a node within a map
//! - **NodeId**: a handle into the index's node arena
//! - **fold**: the text normalizer applied once to every display name

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four tag fields a record may carry.
///
/// The declaration order is significant: it is the order fields are
/// processed per record during a build, the nesting order of the hierarchy
/// (Artist → Album → Title; Genre stands apart) and the primary key of the
/// canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Genre,
    Artist,
    Album,
    Title,
}

impl Field {
    /// All fields in enumeration order.
    pub const ALL: [Field; 4] = [Field::Genre, Field::Artist, Field::Album, Field::Title];

    /// Number of fields.
    pub const COUNT: usize = Field::ALL.len();

    /// Position of this field in [`Field::ALL`], for table lookups.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether a node of this field becomes the parent of the fields that
    /// follow it in the same record. Genre sits outside the hierarchy.
    pub fn nests(self) -> bool {
        self != Field::Genre
    }

    /// Lowercase name, as used in configuration and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Genre => "genre",
            Field::Artist => "artist",
            Field::Album => "album",
            Field::Title => "title",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a node within one child map: its field plus display name.
///
/// A Genre and an Artist may share a name in the root map; the field
/// component keeps them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub field: Field,
    pub name: String,
}

impl Key {
    pub fn new(field: Field, name: impl Into<String>) -> Self {
        Key {
            field,
            name: name.into(),
        }
    }
}

/// Handle to a node in the index arena.
///
/// Handles are only meaningful for the index generation that produced them;
/// a rebuild invalidates all outstanding handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// # Panics
    ///
    /// Panics if `idx` does not fit in a `u32`.
    pub(crate) fn from_usize(idx: usize) -> Self {
        NodeId(u32::try_from(idx).expect("node arena exceeds u32 handle space"))
    }

    /// Position of the node in the arena.
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fold a display name into its comparison form.
///
/// Matching is done against folded names only; display and ordering always
/// use the original text.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Statistics about the current index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Whether the index is built and queryable
    pub valid: bool,

    /// Number of records the index was built from
    pub record_count: usize,

    /// Nodes per field, indexed by [`Field::index`]
    pub nodes_per_field: [usize; Field::COUNT],

    /// When the index was last built
    pub last_built: Option<DateTime<Utc>>,

    /// Rebuild/clear counter at the time these stats were taken
    pub generation: u64,
}

impl IndexStats {
    /// Total number of nodes across all fields
    pub fn total_nodes(&self) -> usize {
        self.nodes_per_field.iter().sum()
    }

    /// Number of nodes of one field
    pub fn nodes(&self, field: Field) -> usize {
        self.nodes_per_field[field.index()]
    }
}
