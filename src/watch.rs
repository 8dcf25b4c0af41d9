//! The watcher: load the page, observe the board, re-scan on change.
//!
//! Three event sources drive the watcher, all funnelled through one
//! poll loop: the initial load, a changed board fingerprint, and a
//! changed page URL. A URL change tears the watch scope down before
//! re-running the whole initialization sequence (manifest fetch,
//! fresh scan, fresh container discovery), so scopes never
//! accumulate across navigations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use scraper::Html;

use crate::board;
use crate::error::{Error, Result};
use crate::manifest::ManifestSource;
use crate::reconcile::Reconciler;
use crate::{NavigationChange, ScanReport, WatchConfig};

type OnReportHandler = Arc<dyn Fn(&ScanReport) + Send + Sync>;
type OnNavigationHandler = Arc<dyn Fn(&NavigationChange) + Send + Sync>;

/// Tracks the last observed navigation URL. Held by the watcher
/// rather than living in module state, so each watcher owns its own
/// navigation history.
#[derive(Debug, Default)]
pub struct UrlWatcher {
    last_url: Option<String>,
}

impl UrlWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `url` and return the change if it differs from the
    /// last observed one. The first observation is never a change.
    pub fn observe(&mut self, url: &str) -> Option<NavigationChange> {
        match self.last_url.as_deref() {
            Some(last) if last == url => None,
            Some(last) => {
                let change = NavigationChange { from: last.to_string(), to: url.to_string() };
                self.last_url = Some(url.to_string());
                Some(change)
            }
            None => {
                self.last_url = Some(url.to_string());
                None
            }
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.last_url.as_deref()
    }
}

/// The board subtree currently under observation. Dropped wholesale
/// on navigation, then rebuilt by container discovery.
struct WatchScope {
    fingerprint: String,
}

/// Signals a running [`Watcher::run`] loop to stop after its current
/// tick.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A board watcher bound to one manifest source.
pub struct Watcher {
    client: Client,
    config: WatchConfig,
    manifest_source: ManifestSource,

    target_url: Option<String>,
    last_html: Option<String>,
    url_watcher: UrlWatcher,

    reconciler: Option<Reconciler>,
    scope: Option<WatchScope>,
    last_report: Option<ScanReport>,

    on_report: Option<OnReportHandler>,
    on_navigation: Option<OnNavigationHandler>,

    stop: Arc<AtomicBool>,
}

impl Watcher {
    pub fn new(config: WatchConfig, manifest_source: ManifestSource) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            manifest_source,
            target_url: None,
            last_html: None,
            url_watcher: UrlWatcher::new(),
            reconciler: None,
            scope: None,
            last_report: None,
            on_report: None,
            on_navigation: None,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Register a callback invoked after every scan.
    pub fn on_report<F>(&mut self, cb: F)
    where
        F: Fn(&ScanReport) + Send + Sync + 'static,
    {
        self.on_report = Some(Arc::new(cb));
    }

    pub fn clear_on_report(&mut self) {
        self.on_report = None;
    }

    /// Register a callback invoked when the page URL changes.
    pub fn on_navigation<F>(&mut self, cb: F)
    where
        F: Fn(&NavigationChange) + Send + Sync + 'static,
    {
        self.on_navigation = Some(Arc::new(cb));
    }

    pub fn clear_on_navigation(&mut self) {
        self.on_navigation = None;
    }

    /// True when a board container has been discovered and is being
    /// watched for mutations.
    pub fn attached(&self) -> bool {
        self.scope.is_some()
    }

    /// The URL observed on the most recent fetch, after redirects.
    pub fn current_url(&self) -> Option<&str> {
        self.url_watcher.last()
    }

    pub fn latest_report(&self) -> Option<&ScanReport> {
        self.last_report.as_ref()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop.clone())
    }

    /// Point the watcher at a page and run the full initialization
    /// sequence: fetch the page and the manifest, scan once, and
    /// discover the board container on the retry schedule.
    pub fn goto(&mut self, url: &str) -> Result<()> {
        self.target_url = Some(url.to_string());
        self.initialize()
    }

    /// Fetch the target page, returning the final URL (after
    /// redirects) and the body.
    fn fetch_page(&self) -> Result<(String, String)> {
        let url = self
            .target_url
            .as_deref()
            .ok_or_else(|| Error::LoadError("No page to watch".into()))?;

        let mut req = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone());
        for (name, value) in &self.config.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req
            .send()
            .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", url, e)))?;
        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;
        Ok((final_url, body))
    }

    /// The startup sequence. Tears down any previous watch scope
    /// first; a failed manifest load leaves the watcher idle (logged,
    /// not fatal) until the next navigation re-attempts it.
    fn initialize(&mut self) -> Result<()> {
        self.scope = None;
        self.reconciler = None;
        self.last_report = None;

        let (final_url, body) = self.fetch_page()?;
        // An explicit goto is not a detected navigation.
        let _ = self.url_watcher.observe(&final_url);
        self.last_html = Some(body);

        let loaded = self
            .manifest_source
            .load(&self.client, &final_url)
            .and_then(|m| Reconciler::new(&m));
        match loaded {
            Ok(rec) => self.reconciler = Some(rec),
            Err(e) => {
                warn!("Error loading pieces data: {}", e);
                return Ok(());
            }
        }

        self.run_scan();
        self.attach();
        Ok(())
    }

    /// Scan the most recently fetched document and fire the report
    /// callback. No-op while the watcher is idle.
    fn run_scan(&mut self) {
        let (Some(rec), Some(html)) = (&self.reconciler, &self.last_html) else {
            return;
        };
        let doc = Html::parse_document(html);
        let report = rec.scan(&doc);

        if report.complete {
            info!("All pieces found with valid squares");
        } else {
            info!("Missing pieces: {}", report.missing.join(", "));
        }
        if let Some(cb) = &self.on_report {
            cb(&report);
        }
        self.last_report = Some(report);
    }

    /// Discover the board container, re-fetching and retrying on the
    /// escalating schedule. Exhaustion is a log line, never an error;
    /// no further attempts happen until the next initialization.
    fn attach(&mut self) {
        if self.try_attach() {
            return;
        }
        let delays = self.config.container_retry_delays_ms.clone();
        for delay in delays {
            if self.stop.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(Duration::from_millis(delay));
            match self.fetch_page() {
                Ok((_, body)) => self.last_html = Some(body),
                Err(e) => debug!("Container retry fetch failed: {}", e),
            }
            if self.try_attach() {
                return;
            }
        }
        warn!("No board container found; giving up on mutation watching");
    }

    fn try_attach(&mut self) -> bool {
        let Some(html) = &self.last_html else {
            return false;
        };
        let doc = Html::parse_document(html);
        match board::find_container(&doc) {
            Some(b) => {
                info!("Board container attached");
                self.scope = Some(WatchScope { fingerprint: board::fingerprint(b.root) });
                true
            }
            None => false,
        }
    }

    /// One poll tick: re-fetch the page, handle a URL change, and
    /// re-scan when the board fingerprint moved.
    pub fn poll_once(&mut self) -> Result<()> {
        let (final_url, body) = self.fetch_page()?;

        if let Some(change) = self.url_watcher.observe(&final_url) {
            info!("Navigation detected: {} -> {}", change.from, change.to);
            if let Some(cb) = &self.on_navigation {
                cb(&change);
            }
            self.target_url = Some(change.to.clone());
            return self.initialize();
        }

        let moved = match &self.scope {
            Some(scope) => {
                let doc = Html::parse_document(&body);
                match board::find_container(&doc) {
                    Some(b) => {
                        let fingerprint = board::fingerprint(b.root);
                        (fingerprint != scope.fingerprint).then_some(fingerprint)
                    }
                    None => {
                        debug!("Board container not present this tick");
                        None
                    }
                }
            }
            None => None,
        };

        self.last_html = Some(body);
        if let Some(fingerprint) = moved {
            debug!("Board mutation detected");
            self.scope = Some(WatchScope { fingerprint });
            self.run_scan();
        }
        Ok(())
    }

    /// Fetch the page and scan it immediately, regardless of
    /// fingerprints. Fails while the watcher is idle (no manifest).
    pub fn scan_now(&mut self) -> Result<ScanReport> {
        let (_, body) = self.fetch_page()?;
        self.last_html = Some(body);
        if self.reconciler.is_none() {
            return Err(Error::ScanError("No manifest loaded".into()));
        }
        self.run_scan();
        self.last_report
            .clone()
            .ok_or_else(|| Error::ScanError("Scan produced no report".into()))
    }

    /// Drive the poll loop on the calling thread until stopped via a
    /// [`StopHandle`]. Individual tick failures degrade to warnings.
    pub fn run(&mut self) -> Result<()> {
        if self.target_url.is_none() {
            return Err(Error::ConfigError("No page to watch; call goto first".into()));
        }
        let interval = Duration::from_millis(self.config.poll_interval_ms);
        while !self.stop.load(Ordering::SeqCst) {
            if let Err(e) = self.poll_once() {
                warn!("Poll failed: {}", e);
            }
            thread::sleep(interval);
        }
        Ok(())
    }
}
