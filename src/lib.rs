//! Boardwatch
//!
//! A headless chessboard reconciliation engine for Rust. It fetches a
//! page, detects chess piece elements in the document through a
//! cascade of selector and attribute heuristics, compares what it
//! found against an expected manifest, and re-runs the comparison as
//! the observed board changes.
//!
//! # Design
//!
//! - **Detection is best-effort**: several selector conventions, two
//!   piece-identity tiers, and four square tiers (ending in geometric
//!   inference from inline-style boxes) are tried in order.
//! - **Mutation watching is polling-based**: each tick re-fetches the
//!   page and fingerprints the board subtree; a changed fingerprint
//!   triggers a full re-scan against the unchanged manifest.
//! - **Navigation re-initializes**: a URL change tears down the watch
//!   scope and re-runs the whole startup sequence, manifest fetch
//!   included.
//!
//! # Example
//!
//! ```no_run
//! use boardwatch::{ManifestSource, WatchConfig, Watcher};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WatchConfig {
//!     poll_interval_ms: 500,
//!     ..Default::default()
//! };
//!
//! let mut watcher = Watcher::new(config, ManifestSource::Url("pieces.json".into()))?;
//! watcher.on_report(|report| {
//!     for line in &report.missing {
//!         println!("{}", line);
//!     }
//! });
//! watcher.goto("https://example.com/play")?;
//! let report = watcher.scan_now()?;
//! println!("complete: {}", report.complete);
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};

pub mod error;
pub use error::{Error, Result};

pub mod board;
pub mod layout;
pub mod manifest;
pub mod piece;
pub mod reconcile;
pub mod resolve;
pub mod square;
pub mod watch;

// Async-friendly watcher API (worker-thread backed)
pub mod async_api;

pub use async_api::BoardWatch;
pub use manifest::{Manifest, ManifestSource, PieceSpec};
pub use piece::{Color, Piece, PieceKind};
pub use reconcile::Reconciler;
pub use square::Square;
pub use watch::{StopHandle, Watcher};

/// Configuration for the board watcher
///
/// Defaults are chosen to be conservative: a desktop user agent, a
/// 30s fetch timeout, a 500ms poll, and a short escalating retry
/// schedule for board-container discovery.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// User agent string to send with requests
    pub user_agent: String,
    /// Timeout for page and manifest fetches in milliseconds
    pub timeout_ms: u64,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// How often the page is re-fetched to look for board mutations
    /// and URL changes, in milliseconds
    pub poll_interval_ms: u64,
    /// Waits between board-container discovery attempts, in
    /// milliseconds. Discovery gives up (with a log line, not an
    /// error) once the schedule is exhausted.
    pub container_retry_delays_ms: Vec<u64>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            user_agent:
                "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/115.0 Boardwatch/0.1"
                    .to_string(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            poll_interval_ms: 500,
            container_retry_delays_ms: vec![250, 500, 1000, 2000, 5000],
        }
    }
}

/// The outcome of one reconciliation scan
///
/// Returned by [`Reconciler::scan`] and delivered to the watcher's
/// report callback. Scanning an unchanged document twice yields
/// identical reports.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// True iff every expected piece type is fully accounted for
    pub complete: bool,
    /// One human-readable entry per piece type with a deficit
    pub missing: Vec<String>,
    /// Detected instances per type in document-encounter order;
    /// `None` marks an instance whose square could not be resolved
    pub positions: BTreeMap<Piece, Vec<Option<Square>>>,
}

/// A single-page navigation observed by the URL watcher
#[derive(Debug, Clone)]
pub struct NavigationChange {
    /// URL before the change
    pub from: String,
    /// URL after the change
    pub to: String,
}
