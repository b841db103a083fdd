//! Hierarchical in-memory index over a record source.
//!
//! The `Index` turns a flat sequence of tagged records into a forest of
//! nodes keyed by `(field, name)`. Each distinct Artist becomes a root node,
//! its Albums become children, and their Titles grandchildren. Genres are
//! kept as root nodes beside the Artists and never become parents.
//!
//! ## Architecture
//!
//! - A `Vec<Node>` arena owns every node; [`NodeId`] handles point into it
//! - Each node holds a `HashMap<Key, NodeId>` of its children
//! - A root `HashMap<Key, NodeId>` holds the top-level Genre and Artist nodes
//! - Parent links are plain `NodeId`s, so teardown is a single `clear()`
//!
//! The index is rebuilt wholesale whenever the source changes structurally.
//! A build is linear in the number of present fields and never re-sorts.

use crate::rank::{self, Ranked};
use crate::search::{self, SearchOptions, SearchTerms};
use crate::source::RecordSource;
use crate::types::{fold, Field, Key, NodeId};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// One distinct value of one field within its hierarchical context.
#[derive(Debug, Clone)]
pub struct Node {
    field: Field,
    name: String,
    folded: String,
    parent: Option<NodeId>,
    children: HashMap<Key, NodeId>,
    matches: Vec<usize>,
}

impl Node {
    fn new(field: Field, name: &str, parent: Option<NodeId>) -> Self {
        Node {
            field,
            name: name.to_string(),
            folded: fold(name),
            parent,
            children: HashMap::new(),
            matches: Vec::new(),
        }
    }

    /// The field this node represents
    pub fn field(&self) -> Field {
        self.field
    }

    /// Display name in its original case
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Folded name used for matching
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Enclosing node, `None` for top-level nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child map scoped to this node
    pub fn children(&self) -> &HashMap<Key, NodeId> {
        &self.children
    }

    /// Indices of the records covered by this node, in increasing order
    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    /// Number of records covered by this node
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

/// The forest of nodes built from a record source.
///
/// An index is either valid (built and queryable) or absent (never built,
/// or cleared). Searching an absent index yields nothing.
#[derive(Debug, Default)]
pub struct Index {
    nodes: Vec<Node>,
    roots: HashMap<Key, NodeId>,
    record_count: usize,
    valid: bool,
}

impl Index {
    /// Create an empty, unbuilt index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh index from a record source.
    pub fn from_source<S: RecordSource + ?Sized>(source: &S) -> Self {
        let mut index = Index::new();
        index.build(source);
        index
    }

    /// Whether the index has been built and not cleared since.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Number of records the index was built from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Total number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Discard the entire forest. The index is absent afterwards.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.record_count = 0;
        self.valid = false;
    }

    /// Replace the forest with one built from `source`.
    ///
    /// Records are processed in source order and fields in [`Field`] order.
    /// Each present field looks up or inserts a node in the current map and
    /// appends the record index to it; every field except Genre then moves
    /// the cursor into that node's children. A blank field creates nothing
    /// and leaves the cursor where it was.
    #[instrument(skip(self, source))]
    pub fn build<S: RecordSource + ?Sized>(&mut self, source: &S) {
        self.clear();

        let records = source.record_count();
        for record in 0..records {
            let mut parent: Option<NodeId> = None;

            for field in Field::ALL {
                let Some(value) = source.field(record, field) else {
                    continue;
                };

                let id = self.lookup_or_insert(parent, field, value);
                self.nodes[id.as_usize()].matches.push(record);

                // genre is outside the hierarchy
                if field.nests() {
                    parent = Some(id);
                }
            }
        }

        self.record_count = records;
        self.valid = true;

        debug!(
            records = records,
            nodes = self.nodes.len(),
            roots = self.roots.len(),
            "Index built"
        );
    }

    fn lookup_or_insert(&mut self, parent: Option<NodeId>, field: Field, name: &str) -> NodeId {
        let key = Key::new(field, name);
        if let Some(id) = self.map(parent).get(&key) {
            return *id;
        }

        let id = NodeId::from_usize(self.nodes.len());
        self.nodes.push(Node::new(field, name, parent));
        match parent {
            Some(p) => self.nodes[p.as_usize()].children.insert(key, id),
            None => self.roots.insert(key, id),
        };
        id
    }

    fn map(&self, parent: Option<NodeId>) -> &HashMap<Key, NodeId> {
        match parent {
            Some(p) => &self.nodes[p.as_usize()].children,
            None => &self.roots,
        }
    }

    /// The top-level map holding Genre and Artist nodes.
    pub fn roots(&self) -> &HashMap<Key, NodeId> {
        &self.roots
    }

    /// Get a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this index's current generation.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_usize()]
    }

    /// Find the node for `(field, name)` directly under `parent`
    /// (or at the top level when `parent` is `None`).
    pub fn lookup(&self, parent: Option<NodeId>, field: Field, name: &str) -> Option<NodeId> {
        self.map(parent).get(&Key::new(field, name)).copied()
    }

    /// Iterate over a node's ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            index: self,
            next: self.node(id).parent,
        }
    }

    /// Iterate over every node in the arena.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::from_usize(i), node))
    }

    /// Count nodes per field, indexed by [`Field::index`].
    pub fn nodes_per_field(&self) -> [usize; Field::COUNT] {
        let mut counts = [0; Field::COUNT];
        for node in &self.nodes {
            counts[node.field.index()] += 1;
        }
        counts
    }

    /// Search the index and rank the candidates.
    ///
    /// Returns an empty result with zero hidden items when the index is
    /// absent.
    pub fn search(&self, terms: &SearchTerms, options: &SearchOptions) -> Ranked {
        if !self.valid {
            return Ranked::default();
        }

        let candidates = if options.parallel && self.nodes.len() >= options.parallel_threshold {
            search::collect_candidates_parallel(self, terms)
        } else {
            search::collect_candidates(self, terms)
        };

        rank::rank(self, candidates, options.max_results)
    }
}

/// Iterator over a node's ancestors, see [`Index::ancestors`].
pub struct Ancestors<'a> {
    index: &'a Index,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.index.node(id);
        self.next = node.parent;
        Some((id, node))
    }
}
