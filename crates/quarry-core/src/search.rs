//! Multi-term substring search over the index forest.
//!
//! A search walks every node, threading a bitmask of "terms not yet found"
//! from parent to child. A term found in an ancestor's name counts for all
//! of its descendants, so `beatles abbey` finds the album *Abbey Road* under
//! the artist *The Beatles* even though neither name contains both terms.
//!
//! A node becomes a candidate once its mask is empty, unless it has exactly
//! one child: that child describes the same records more specifically and
//! will be reached by the walk on its own.
//!
//! ## Term limits
//!
//! Each term occupies one bit of a `u32` mask, so at most [`MAX_TERMS`]
//! terms constrain a search. Further terms are kept but are always treated
//! as satisfied.

use crate::index::Index;
use crate::types::{fold, Field, Key, NodeId};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// Number of terms a single search can track.
pub const MAX_TERMS: usize = u32::BITS as usize;

/// An ordered list of folded search terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerms {
    terms: Vec<String>,
}

impl SearchTerms {
    /// Create a term list from already-folded terms.
    ///
    /// Terms are used as given; callers are expected to have lowercased
    /// them and dropped empty ones.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        if terms.len() > MAX_TERMS {
            warn!(
                terms = terms.len(),
                limit = MAX_TERMS,
                "Search terms beyond the limit will not narrow results"
            );
        }
        SearchTerms { terms }
    }

    /// Tokenize raw user input: fold it, then split on whitespace.
    ///
    /// # Example
    /// ```
    /// use quarry_core::SearchTerms;
    /// let terms = SearchTerms::parse("  Abbey ROAD ");
    /// assert_eq!(terms.as_slice(), &["abbey", "road"]);
    /// ```
    pub fn parse(input: &str) -> Self {
        Self::new(parse_terms(input))
    }

    /// All terms, including any beyond [`MAX_TERMS`].
    pub fn as_slice(&self) -> &[String] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True when there are no terms; every node then qualifies.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The terms that occupy a mask bit.
    fn active(&self) -> &[String] {
        &self.terms[..self.terms.len().min(MAX_TERMS)]
    }

    /// Mask with one set bit per active term.
    pub fn initial_mask(&self) -> u32 {
        match self.active().len() {
            MAX_TERMS => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }

    /// Clear the bits of every outstanding term found in `folded`.
    ///
    /// A node without children stops at the first term it lacks, since the
    /// mask can no longer reach zero along this branch.
    pub fn narrow(&self, mask: u32, folded: &str, has_children: bool) -> u32 {
        let mut mask = mask;

        for (t, term) in self.active().iter().enumerate() {
            let bit = 1u32 << t;
            if mask & bit == 0 {
                continue;
            }

            if folded.contains(term.as_str()) {
                mask &= !bit;
            } else if !has_children {
                break;
            }
        }

        mask
    }
}

/// Split raw input into folded, non-empty terms.
pub fn parse_terms(input: &str) -> Vec<String> {
    fold(input).split_whitespace().map(str::to_string).collect()
}

/// Options controlling a search and its ranking.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results kept after ranking
    pub max_results: usize,

    /// Fan the walk out over root entries on the rayon pool
    pub parallel: bool,

    /// Minimum node count before the parallel walk is used
    pub parallel_threshold: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            max_results: 20,
            parallel: true,
            parallel_threshold: 10_000,
        }
    }
}

impl SearchOptions {
    /// Set the result cap, clamped to at least one.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Enable or disable the parallel walk.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// An ancestor of a result, for breadcrumb rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub field: Field,
    pub name: String,
}

/// A ranked search result, detached from the index that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Field of the matching node
    pub field: Field,

    /// Display name of the matching node
    pub name: String,

    /// Indices of the records this node covers
    pub matches: Vec<usize>,

    /// Enclosing nodes, nearest first
    pub ancestors: Vec<Crumb>,
}

impl SearchResult {
    /// Snapshot a node and its ancestry.
    pub fn from_node(index: &Index, id: NodeId) -> Self {
        let node = index.node(id);
        SearchResult {
            field: node.field(),
            name: node.name().to_string(),
            matches: node.matches().to_vec(),
            ancestors: index
                .ancestors(id)
                .map(|(_, n)| Crumb {
                    field: n.field(),
                    name: n.name().to_string(),
                })
                .collect(),
        }
    }

    /// Number of records covered
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// The immediate parent, if any
    pub fn parent(&self) -> Option<&Crumb> {
        self.ancestors.first()
    }
}

/// Walk the whole forest and collect every candidate node.
///
/// Candidates come out in map iteration order; ranking imposes the final
/// order.
pub fn collect_candidates(index: &Index, terms: &SearchTerms) -> Vec<NodeId> {
    let mut results = Vec::new();
    walk(index, terms, index.roots(), terms.initial_mask(), &mut results);
    results
}

/// Same as [`collect_candidates`], with each root subtree walked on the
/// rayon pool.
pub fn collect_candidates_parallel(index: &Index, terms: &SearchTerms) -> Vec<NodeId> {
    let mask = terms.initial_mask();
    let roots: Vec<NodeId> = index.roots().values().copied().collect();

    roots
        .par_iter()
        .flat_map_iter(|&id| {
            let mut results = Vec::new();
            visit(index, terms, id, mask, &mut results);
            results
        })
        .collect()
}

fn walk(
    index: &Index,
    terms: &SearchTerms,
    domain: &HashMap<Key, NodeId>,
    mask: u32,
    results: &mut Vec<NodeId>,
) {
    for &id in domain.values() {
        visit(index, terms, id, mask, results);
    }
}

fn visit(index: &Index, terms: &SearchTerms, id: NodeId, mask: u32, results: &mut Vec<NodeId>) {
    let node = index.node(id);
    let children = node.children();
    let new_mask = terms.narrow(mask, node.folded(), !children.is_empty());

    // a node with exactly one child is redundant next to that child
    if new_mask == 0 && children.len() != 1 {
        results.push(id);
    }

    walk(index, terms, children, new_mask, results);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MediaRecord;

    fn names(index: &Index, ids: &[NodeId]) -> Vec<(Field, String)> {
        let mut names: Vec<_> = ids
            .iter()
            .map(|&id| (index.node(id).field(), index.node(id).name().to_string()))
            .collect();
        names.sort();
        names
    }

    fn beatles_index() -> Index {
        Index::from_source(&vec![
            MediaRecord::new("Rock", "The Beatles", "Abbey Road", "Something"),
            MediaRecord::new("Rock", "The Beatles", "Abbey Road", "Because"),
            MediaRecord::new("Rock", "The Beatles", "Revolver", "Taxman"),
            MediaRecord::new("Jazz", "Coltrane", "Ballads", "Say It"),
        ])
    }

    #[test]
    fn test_parse_terms() {
        assert_eq!(parse_terms("Abbey  Road"), vec!["abbey", "road"]);
        assert!(parse_terms("   ").is_empty());
        assert_eq!(parse_terms("ÉTÉ\tx"), vec!["été", "x"]);
    }

    #[test]
    fn test_initial_mask() {
        assert_eq!(SearchTerms::default().initial_mask(), 0);
        assert_eq!(SearchTerms::new(["a"]).initial_mask(), 0b1);
        assert_eq!(SearchTerms::new(["a", "b", "c"]).initial_mask(), 0b111);

        let full: Vec<String> = (0..32).map(|i| format!("t{}", i)).collect();
        assert_eq!(SearchTerms::new(full).initial_mask(), u32::MAX);
    }

    #[test]
    fn test_terms_beyond_limit_are_kept() {
        let many: Vec<String> = (0..40).map(|i| format!("t{}", i)).collect();
        let terms = SearchTerms::new(many);
        assert_eq!(terms.len(), 40);
        assert_eq!(terms.initial_mask(), u32::MAX);
    }

    #[test]
    fn test_narrow() {
        let terms = SearchTerms::new(["abbey", "road", "zzz"]);
        let mask = terms.initial_mask();

        assert_eq!(terms.narrow(mask, "abbey road", true), 0b100);
        assert_eq!(terms.narrow(0b100, "abbey road", true), 0b100);
        // leaf stops at the first missing term
        assert_eq!(terms.narrow(mask, "road", false), 0b111);
        assert_eq!(terms.narrow(mask, "road", true), 0b101);
    }

    #[test]
    fn test_mask_propagates_to_children() {
        let index = beatles_index();
        let terms = SearchTerms::parse("beatles abbey");
        let found = collect_candidates(&index, &terms);

        assert_eq!(
            names(&index, &found),
            vec![
                (Field::Album, "Abbey Road".to_string()),
                (Field::Title, "Because".to_string()),
                (Field::Title, "Something".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_child_is_suppressed() {
        let index = beatles_index();
        let terms = SearchTerms::parse("coltrane");
        let found = collect_candidates(&index, &terms);

        // Coltrane -> Ballads -> Say It: both parents have one child each
        assert_eq!(names(&index, &found), vec![(Field::Title, "Say It".to_string())]);
    }

    #[test]
    fn test_genre_matches_only_itself() {
        let index = beatles_index();
        let found = collect_candidates(&index, &SearchTerms::parse("rock"));
        assert_eq!(names(&index, &found), vec![(Field::Genre, "Rock".to_string())]);
    }

    #[test]
    fn test_empty_terms_browse_everything() {
        let index = beatles_index();
        let found = collect_candidates(&index, &SearchTerms::default());

        // everything except single-child nodes: Coltrane, Ballads, Revolver
        assert_eq!(found.len(), index.len() - 3);
    }

    #[test]
    fn test_no_match() {
        let index = beatles_index();
        assert!(collect_candidates(&index, &SearchTerms::parse("mozart")).is_empty());
    }

    #[test]
    fn test_result_snapshot() {
        let index = beatles_index();
        let beatles = index.lookup(None, Field::Artist, "The Beatles").unwrap();
        let abbey = index.lookup(Some(beatles), Field::Album, "Abbey Road").unwrap();
        let because = index.lookup(Some(abbey), Field::Title, "Because").unwrap();

        let result = SearchResult::from_node(&index, because);
        assert_eq!(result.field, Field::Title);
        assert_eq!(result.matches, vec![1]);
        assert_eq!(result.match_count(), 1);
        assert_eq!(result.parent().unwrap().name, "Abbey Road");
        assert_eq!(result.ancestors[1].field, Field::Artist);
        assert_eq!(result.ancestors.len(), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let index = beatles_index();
        for input in ["", "beatles", "a", "rock abbey", "say"] {
            let terms = SearchTerms::parse(input);
            let sequential = collect_candidates(&index, &terms);
            let parallel = collect_candidates_parallel(&index, &terms);
            assert_eq!(names(&index, &sequential), names(&index, &parallel), "{input:?}");
        }
    }

    #[test]
    fn test_search_options_clamp() {
        let options = SearchOptions::default().with_max_results(0);
        assert_eq!(options.max_results, 1);
    }
}
