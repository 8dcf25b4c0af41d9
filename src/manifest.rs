//! The expected-piece manifest: what the board is supposed to hold.
//!
//! A manifest is a static JSON resource of the shape
//! `{ "pieces": [ { "type": "wp" }, ... ] }` with one entry per
//! expected piece instance; multiplicity is implicit in repetition.
//! It is fetched once per initialization, either over HTTP (resolved
//! against the page URL the way stylesheet hrefs are) or from a local
//! file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::piece::Piece;

/// One expected piece instance.
#[derive(Debug, Clone, Deserialize)]
pub struct PieceSpec {
    #[serde(rename = "type")]
    pub piece_type: String,
}

/// The full expected-piece list.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub pieces: Vec<PieceSpec>,
}

/// Where a manifest comes from.
#[derive(Debug, Clone)]
pub enum ManifestSource {
    /// A URL, absolute or relative to the watched page.
    Url(String),
    /// A local file path.
    Path(PathBuf),
}

impl ManifestSource {
    pub fn load(&self, client: &Client, page_url: &str) -> Result<Manifest> {
        match self {
            ManifestSource::Url(location) => Manifest::fetch(client, page_url, location),
            ManifestSource::Path(path) => Manifest::from_path(path),
        }
    }
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::ManifestError(format!("Malformed manifest: {}", e)))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::ManifestError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Fetch the manifest over HTTP. Relative locations resolve
    /// against the page URL when it parses; otherwise the location is
    /// used as given.
    pub fn fetch(client: &Client, page_url: &str, location: &str) -> Result<Self> {
        let manifest_url = if let Ok(base) = url::Url::parse(page_url) {
            base.join(location)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| location.to_string())
        } else {
            location.to_string()
        };

        let resp = client
            .get(&manifest_url)
            .send()
            .map_err(|e| Error::ManifestError(format!("Failed to fetch {}: {}", manifest_url, e)))?;
        let text = resp
            .text()
            .map_err(|e| Error::ManifestError(format!("Failed to read manifest body: {}", e)))?;
        Self::from_json(&text)
    }

    /// Tally expected counts per piece. An entry whose type parses as
    /// neither spelling makes the whole manifest malformed; a typo
    /// should not silently shrink expectations.
    pub fn expected_counts(&self) -> Result<BTreeMap<Piece, usize>> {
        let mut counts = BTreeMap::new();
        for spec in &self.pieces {
            let piece = Piece::parse(&spec.piece_type).ok_or_else(|| {
                Error::ManifestError(format!(
                    "Unrecognized piece type in manifest: {:?}",
                    spec.piece_type
                ))
            })?;
            *counts.entry(piece).or_insert(0usize) += 1;
        }
        Ok(counts)
    }
}
