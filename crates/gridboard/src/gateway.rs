//! Persistence gateway: tolerant load, fire-and-forget save.
//!
//! Load never fails because the store is down or holds garbage; the caller
//! gets the default layout and a warning in the log. Saves serialize the
//! layout on the caller's thread and hand it to a single long-lived worker,
//! so an apply returns before the network round trip and saves reach the
//! store in apply order. A failed save is logged and dropped: the in-memory
//! layout stays as applied.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use gridboard_layout::{
    FallbackReason, LayoutMap, LayoutOrigin, LayoutPayload, LayoutSink, LoadedLayout, PanelId,
    decode_layout,
};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::LayoutStore;

/// Counts of finished background saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Worker thread that transmits queued bodies one at a time.
struct SaveWorker {
    jobs: Option<Sender<String>>,
    outcomes: Receiver<bool>,
    handle: Option<JoinHandle<()>>,
}

impl SaveWorker {
    fn start(store: Arc<dyn LayoutStore>) -> std::io::Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<String>();
        let (outcome_tx, outcome_rx) = mpsc::channel::<bool>();
        let handle = thread::Builder::new()
            .name("gridboard-save".to_string())
            .spawn(move || save_loop(store.as_ref(), job_rx, outcome_tx))?;
        Ok(Self {
            jobs: Some(job_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
        })
    }

    fn submit(&self, body: String) -> bool {
        self.jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(body).is_ok())
    }
}

impl Drop for SaveWorker {
    fn drop(&mut self) {
        // Closing the queue lets the worker finish what is queued and exit.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn save_loop(store: &dyn LayoutStore, jobs: Receiver<String>, outcomes: Sender<bool>) {
    for body in jobs {
        let ok = transmit(store, &body);
        if outcomes.send(ok).is_err() {
            return;
        }
    }
}

pub struct PersistenceGateway {
    store: Arc<dyn LayoutStore>,
    worker: Option<SaveWorker>,
    queued: usize,
    report: SaveReport,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("store", &self.store.location())
            .field("queued", &self.queued)
            .field("report", &self.report)
            .finish()
    }
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(store: Box<dyn LayoutStore>) -> Self {
        Self {
            store: Arc::from(store),
            worker: None,
            queued: 0,
            report: SaveReport::default(),
        }
    }

    /// Load the layout for `panels`, falling back to the default grid on any
    /// store failure. Only an impossible panel set is an error.
    pub fn load(&self, panels: &[PanelId]) -> Result<LoadedLayout> {
        let loaded = match self.store.fetch() {
            Ok(Some(body)) => decode_layout(&body, panels)?,
            Ok(None) => LoadedLayout::fallback(panels, FallbackReason::LayoutAbsent)?,
            Err(error) => {
                warn!(
                    message = "persist.load_failed",
                    store = %self.store.location(),
                    error = %error
                );
                LoadedLayout::fallback(panels, FallbackReason::Unavailable)?
            }
        };
        match &loaded.origin {
            LayoutOrigin::Stored { dropped } if !dropped.is_empty() => {
                info!(
                    message = "persist.unknown_panels_dropped",
                    dropped = ?dropped
                );
            }
            LayoutOrigin::Default {
                reason: reason @ (FallbackReason::Unavailable | FallbackReason::LayoutAbsent),
            } => {
                debug!(message = "persist.default_layout", reason = %reason);
            }
            LayoutOrigin::Default { reason } => {
                warn!(
                    message = "persist.stored_layout_rejected",
                    store = %self.store.location(),
                    reason = %reason
                );
            }
            _ => {}
        }
        Ok(loaded)
    }

    /// Serialize `layout` now and queue it for the save worker.
    ///
    /// Queued saves are transmitted in submission order, so the store ends up
    /// holding the most recent layout.
    pub fn save_in_background(&mut self, layout: &LayoutMap) {
        self.reap_finished();
        let body = match serde_json::to_string(&LayoutPayload::new(layout.clone())) {
            Ok(body) => body,
            Err(error) => {
                warn!(message = "persist.save_failed", error = %error);
                self.report.failed += 1;
                return;
            }
        };
        if self.worker.is_none() {
            match SaveWorker::start(Arc::clone(&self.store)) {
                Ok(worker) => self.worker = Some(worker),
                Err(error) => {
                    warn!(message = "persist.save_failed", error = %error);
                    self.report.failed += 1;
                    return;
                }
            }
        }
        if self.worker.as_ref().is_some_and(|worker| worker.submit(body)) {
            self.queued += 1;
        } else {
            warn!(message = "persist.save_failed", error = "save worker stopped");
            self.report.failed += 1;
            self.abandon_worker();
        }
    }

    /// Save `layout` on the calling thread, reporting failure to the caller.
    pub fn save_now(&self, layout: &LayoutMap) -> Result<()> {
        let body = serde_json::to_string(&LayoutPayload::new(layout.clone()))?;
        self.store.store(&body)
    }

    /// Block until every queued save has finished.
    pub fn wait_idle(&mut self) -> SaveReport {
        while self.queued > 0 {
            let outcome = self
                .worker
                .as_ref()
                .and_then(|worker| worker.outcomes.recv().ok());
            match outcome {
                Some(ok) => {
                    self.queued -= 1;
                    record(&mut self.report, ok);
                }
                None => self.abandon_worker(),
            }
        }
        self.report
    }

    #[must_use]
    pub fn pending_saves(&self) -> usize {
        self.queued
    }

    #[must_use]
    pub fn store_location(&self) -> String {
        self.store.location()
    }

    fn reap_finished(&mut self) {
        let Some(worker) = self.worker.as_ref() else {
            return;
        };
        while let Ok(ok) = worker.outcomes.try_recv() {
            self.queued = self.queued.saturating_sub(1);
            record(&mut self.report, ok);
        }
    }

    /// Count every unacknowledged save as failed and drop the worker.
    fn abandon_worker(&mut self) {
        self.report.failed += self.queued;
        self.queued = 0;
        self.worker = None;
    }
}

impl LayoutSink for PersistenceGateway {
    fn save(&mut self, layout: &LayoutMap) {
        self.save_in_background(layout);
    }
}

fn transmit(store: &dyn LayoutStore, body: &str) -> bool {
    match store.store(body) {
        Ok(()) => {
            debug!(
                message = "persist.saved",
                store = %store.location(),
                bytes = body.len()
            );
            true
        }
        Err(error) => {
            warn!(
                message = "persist.save_failed",
                store = %store.location(),
                error = %error
            );
            false
        }
    }
}

fn record(report: &mut SaveReport, ok: bool) {
    if ok {
        report.succeeded += 1;
    } else {
        report.failed += 1;
    }
}
