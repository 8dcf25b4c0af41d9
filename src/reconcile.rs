//! Reconciliation: comparing what the document holds against what
//! the manifest expects.

use std::collections::BTreeMap;

use log::debug;
use scraper::Html;

use crate::board;
use crate::error::Result;
use crate::manifest::Manifest;
use crate::piece::Piece;
use crate::resolve::{self, BoardContext};
use crate::square::Square;
use crate::ScanReport;

/// Compares a document against a tallied manifest. All scan state is
/// recomputed from scratch on every call, so scanning an unchanged
/// document twice yields identical reports.
#[derive(Debug, Clone)]
pub struct Reconciler {
    expected: BTreeMap<Piece, usize>,
}

impl Reconciler {
    pub fn new(manifest: &Manifest) -> Result<Self> {
        Ok(Reconciler { expected: manifest.expected_counts()? })
    }

    pub fn from_counts(expected: BTreeMap<Piece, usize>) -> Self {
        Reconciler { expected }
    }

    pub fn expected(&self) -> &BTreeMap<Piece, usize> {
        &self.expected
    }

    /// Parse `html` and scan it. Convenience over [`Reconciler::scan`].
    pub fn scan_html(&self, html: &str) -> ScanReport {
        self.scan(&Html::parse_document(html))
    }

    /// Run one full scan: enumerate candidates, resolve each one's
    /// identity and square, tally, and report per-type deficits.
    pub fn scan(&self, doc: &Html) -> ScanReport {
        let container = board::find_container(doc).and_then(|b| b.rect);
        let ctx = BoardContext { container };

        let mut positions: BTreeMap<Piece, Vec<Option<Square>>> = BTreeMap::new();
        for el in board::piece_candidates(doc) {
            // Untypeable candidates are skipped, not errors.
            let Some(piece) = resolve::resolve_piece(&el) else {
                continue;
            };
            let square = resolve::resolve_square(&el, &ctx);
            positions.entry(piece).or_default().push(square);
        }

        let mut missing = Vec::new();
        for (piece, &want) in &self.expected {
            let found = positions.get(piece).map(Vec::as_slice).unwrap_or(&[]);
            if found.len() >= want {
                continue;
            }
            let mut line = format!("{}: missing {} of {}", piece.code(), want - found.len(), want);
            if !found.is_empty() {
                let squares = found
                    .iter()
                    .map(|s| s.map_or_else(|| "unknown".to_string(), |sq| sq.to_string()))
                    .collect::<Vec<_>>()
                    .join(", ");
                line.push_str(&format!(". Remaining on squares: {}", squares));
            }
            missing.push(line);
        }

        let complete = missing.is_empty();
        debug!(
            "scan: {} expected types, {} detected types, complete={}",
            self.expected.len(),
            positions.len(),
            complete
        );

        ScanReport { complete, missing, positions }
    }
}
