//! Ranking, truncation and display ordering of search candidates.
//!
//! Ranking runs in two passes over the full candidate list:
//!
//! 1. Sort by match count (descending), ties broken by canonical order, and
//!    keep at most `max_results` entries. The rest are counted as hidden.
//! 2. Re-sort the survivors by canonical order alone for display.
//!
//! Canonical order compares field first (Genre < Artist < Album < Title),
//! then display name, then ancestry: a top-level node precedes a nested
//! one, and two nested nodes compare by their parents.

use crate::index::Index;
use crate::types::NodeId;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Ranked candidates plus the number dropped by truncation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranked {
    /// Surviving candidates in canonical order
    pub items: Vec<NodeId>,

    /// Candidates removed because they exceeded the result cap
    pub hidden: usize,
}

impl Ranked {
    /// Candidates found before truncation
    pub fn total(&self) -> usize {
        self.items.len() + self.hidden
    }
}

/// Rank, truncate and order candidates.
pub fn rank(index: &Index, mut candidates: Vec<NodeId>, max_results: usize) -> Ranked {
    candidates.sort_by(|&a, &b| rank_cmp(index, a, b));

    let mut hidden = 0;
    if candidates.len() > max_results {
        hidden = candidates.len() - max_results;
        candidates.truncate(max_results);
    }

    candidates.sort_by(|&a, &b| canonical_cmp(index, a, b));

    Ranked {
        items: candidates,
        hidden,
    }
}

/// Ranking order: more covered records first, then canonical order.
pub fn rank_cmp(index: &Index, a: NodeId, b: NodeId) -> Ordering {
    index
        .node(b)
        .match_count()
        .cmp(&index.node(a).match_count())
        .then_with(|| canonical_cmp(index, a, b))
}

/// Canonical order: field, then display name, then ancestry.
pub fn canonical_cmp(index: &Index, a: NodeId, b: NodeId) -> Ordering {
    let (left, right) = (index.node(a), index.node(b));

    left.field()
        .cmp(&right.field())
        .then_with(|| compare_names(left.name(), right.name()))
        .then_with(|| match (left.parent(), right.parent()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(pa), Some(pb)) => canonical_cmp(index, pa, pb),
        })
}

/// Compare display names the way a person reads them.
///
/// Letters compare case-insensitively and runs of digits compare by
/// numeric value, so "Track 2" sorts before "track 10". Names that differ
/// only in case or leading zeros fall back to byte order, keeping the order
/// total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        let ord = match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_digits(&mut a);
                let right = take_digits(&mut b);
                compare_digit_runs(&left, &right)
            }
            (Some(x), Some(y)) => {
                a.next();
                b.next();
                x.to_lowercase().cmp(y.to_lowercase())
            }
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
