//! Async-friendly watcher API (worker-thread backed).

use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::manifest::ManifestSource;
use crate::watch::Watcher;
use crate::{Error, Result, ScanReport, WatchConfig};

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    ScanNow(oneshot::Sender<Result<ScanReport>>),
    PollOnce(oneshot::Sender<Result<()>>),
    LatestReport(oneshot::Sender<Option<ScanReport>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly board watcher backed by a dedicated worker
/// thread.
///
/// The worker thread owns a blocking [`Watcher`] and executes
/// commands sent from async tasks, so callers get an async interface
/// without the watcher itself needing to be `Send` across await
/// points. Continuous watching from async code is a matter of
/// calling [`BoardWatch::poll_once`] on whatever cadence suits the
/// caller.
#[derive(Clone)]
pub struct BoardWatch {
    cmd_tx: Sender<Command>,
}

impl BoardWatch {
    /// Create a new watch handle (spawns the worker thread that owns
    /// the watcher).
    pub async fn new(config: Option<WatchConfig>, manifest: ManifestSource) -> Result<Self> {
        let config = config.unwrap_or_default();

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the watcher on the worker thread
            let mut watcher = match Watcher::new(config, manifest) {
                Ok(w) => w,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Goto(url, resp) => {
                        let _ = resp.send(watcher.goto(&url));
                    }
                    Command::ScanNow(resp) => {
                        let _ = resp.send(watcher.scan_now());
                    }
                    Command::PollOnce(resp) => {
                        let _ = resp.send(watcher.poll_once());
                    }
                    Command::LatestReport(resp) => {
                        let _ = resp.send(watcher.latest_report().cloned());
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        match init_rx.await {
            Ok(Ok(())) => Ok(Self { cmd_tx }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::InitializationError(
                "Watcher worker exited during startup".into(),
            )),
        }
    }

    fn send(&self, cmd: Command) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| Error::Other("Watcher worker is closed".into()))
    }

    /// Point the watcher at a page and run initialization.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Goto(url.to_string(), tx))?;
        rx.await
            .map_err(|_| Error::Other("Watcher worker dropped the response".into()))?
    }

    /// Fetch and scan immediately, returning the report.
    pub async fn scan_now(&self) -> Result<ScanReport> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::ScanNow(tx))?;
        rx.await
            .map_err(|_| Error::Other("Watcher worker dropped the response".into()))?
    }

    /// Run one poll tick (URL check + mutation check).
    pub async fn poll_once(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::PollOnce(tx))?;
        rx.await
            .map_err(|_| Error::Other("Watcher worker dropped the response".into()))?
    }

    /// The most recent scan report, if any scan has run.
    pub async fn latest_report(&self) -> Result<Option<ScanReport>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::LatestReport(tx))?;
        rx.await
            .map_err(|_| Error::Other("Watcher worker dropped the response".into()))
    }

    /// Shut the worker down.
    pub async fn close(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Close(tx))?;
        rx.await
            .map_err(|_| Error::Other("Watcher worker dropped the response".into()))?
    }
}
