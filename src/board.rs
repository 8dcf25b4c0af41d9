//! Locating the board container and enumerating piece candidates.
//!
//! Board widgets disagree about markup, so both the container and the
//! pieces are found through an ordered list of known selector
//! conventions. The piece strategies are unioned into one combined
//! selector, which settles how multi-matching elements are counted:
//! `scraper` yields each matching node exactly once, in document
//! order, however many of the strategies it satisfies.

use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};

use crate::layout::{self, Rect};

/// Known board container selectors, in preference order; the first
/// with a match wins.
pub const CONTAINER_SELECTORS: &[&str] = &[
    "chess-board",
    "cg-board",
    "#board",
    ".board",
    ".chessboard",
];

/// Piece candidate strategies: structured attribute, canonical class,
/// legacy class, and the bare custom element some widgets use.
pub const PIECE_SELECTORS: &[&str] = &["[data-piece]", ".piece", ".chess-piece", "piece"];

/// Attributes that carry piece identity or placement. Only these
/// (plus element structure and character data) participate in the
/// board fingerprint, so unrelated attribute churn does not count as
/// a mutation.
pub const OBSERVED_ATTRIBUTES: &[&str] = &["class", "data-piece", "data-square"];

/// A discovered board scope: the container element plus, when the
/// markup states one, its bounding box.
#[derive(Debug, Clone)]
pub struct Board<'a> {
    pub root: ElementRef<'a>,
    pub rect: Option<Rect>,
}

fn piece_selector() -> Selector {
    Selector::parse(&PIECE_SELECTORS.join(", ")).unwrap()
}

/// Find the first board container present in the document.
pub fn find_container(doc: &Html) -> Option<Board<'_>> {
    for sel in CONTAINER_SELECTORS {
        let selector = Selector::parse(sel).unwrap();
        if let Some(root) = doc.select(&selector).next() {
            let rect = layout::container_rect(&root);
            return Some(Board { root, rect });
        }
    }
    None
}

/// Enumerate piece candidates over the whole document, in document
/// order, each node at most once.
pub fn piece_candidates(doc: &Html) -> Vec<ElementRef<'_>> {
    let selector = piece_selector();
    doc.select(&selector).collect()
}

/// Hash the observable state of a subtree: tag names, the observed
/// attribute allowlist, and character data, walked depth-first in
/// document order. Two fingerprints differ iff a child was added or
/// removed, an allowlisted attribute changed, or text changed.
pub fn fingerprint(root: ElementRef<'_>) -> String {
    let mut hasher = Sha256::new();
    let mut stack: Vec<ElementRef<'_>> = vec![root];
    while let Some(node) = stack.pop() {
        hasher.update(node.value().name().as_bytes());
        hasher.update([0x1e]);
        for attr in OBSERVED_ATTRIBUTES {
            if let Some(value) = node.value().attr(attr) {
                hasher.update(attr.as_bytes());
                hasher.update([0x1f]);
                hasher.update(value.as_bytes());
                hasher.update([0x1f]);
            }
        }
        // Direct text children only; descendants hash at their own
        // depth.
        for child in node.children() {
            if let Some(text) = child.value().as_text() {
                hasher.update(text.as_bytes());
                hasher.update([0x1f]);
            }
        }
        let children: Vec<_> = node
            .children()
            .filter_map(ElementRef::wrap)
            .collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }
    hex::encode(hasher.finalize())
}
