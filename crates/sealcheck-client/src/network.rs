//! Network-idle detection from CDP network events.
//!
//! The page counts as idle once no request has been in flight for a quiet
//! window (500 ms by default). Listeners must be attached before navigation
//! starts, otherwise early requests are never seen.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chromiumoxide::Page;
use chromiumoxide::error::CdpError;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, ResourceType,
};
use futures::StreamExt;
use futures::stream::BoxStream;
use sealcheck_core::AppError;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// In-flight request bookkeeping.
#[derive(Debug)]
pub struct IdleTracker {
    in_flight: HashSet<String>,
    last_activity: Instant,
    document_error: Option<String>,
}

impl IdleTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            in_flight: HashSet::new(),
            last_activity: now,
            document_error: None,
        }
    }

    pub fn request_started(&mut self, id: String, now: Instant) {
        self.in_flight.insert(id);
        self.last_activity = now;
    }

    pub fn request_finished(&mut self, id: &str, now: Instant) {
        self.in_flight.remove(id);
        self.last_activity = now;
    }

    /// Records a failed top-level document load (e.g. `net::ERR_CONNECTION_REFUSED`).
    pub fn document_failed(&mut self, error: String) {
        self.document_error = Some(error);
    }

    pub fn document_error(&self) -> Option<&str> {
        self.document_error.as_deref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_idle(&self, now: Instant, window: Duration) -> bool {
        self.in_flight.is_empty() && now.saturating_duration_since(self.last_activity) >= window
    }

    /// `Ok(true)` once idle. A failed document load wins over idleness.
    pub fn settled(&self, now: Instant, window: Duration) -> Result<bool, &str> {
        match self.document_error() {
            Some(error) => Err(error),
            None => Ok(self.is_idle(now, window)),
        }
    }
}

enum NetEvent {
    Started(String),
    Finished(String),
    Failed {
        id: String,
        document_error: Option<String>,
    },
}

/// Feeds a page's network events into an [`IdleTracker`] on a background task.
pub struct NetworkMonitor {
    tracker: Arc<Mutex<IdleTracker>>,
    pump: JoinHandle<()>,
}

impl NetworkMonitor {
    pub async fn attach(page: &Page) -> Result<Self, AppError> {
        let listen_err = |e: CdpError| {
            AppError::BrowserLaunch(format!("Failed to subscribe to network events: {e}"))
        };

        let started: BoxStream<'static, NetEvent> = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listen_err)?
            .map(|event| NetEvent::Started(event.request_id.inner().clone()))
            .boxed();
        let finished: BoxStream<'static, NetEvent> = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(listen_err)?
            .map(|event| NetEvent::Finished(event.request_id.inner().clone()))
            .boxed();
        let failed: BoxStream<'static, NetEvent> = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listen_err)?
            .map(|event| NetEvent::Failed {
                id: event.request_id.inner().clone(),
                document_error: (event.r#type == ResourceType::Document
                    && event.canceled != Some(true))
                .then(|| event.error_text.clone()),
            })
            .boxed();

        let tracker = Arc::new(Mutex::new(IdleTracker::new(Instant::now())));
        let sink = Arc::clone(&tracker);
        let mut events = futures::stream::select_all([started, finished, failed]);

        let pump = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let now = Instant::now();
                let Ok(mut tracker) = sink.lock() else { break };
                match event {
                    NetEvent::Started(id) => tracker.request_started(id, now),
                    NetEvent::Finished(id) => tracker.request_finished(&id, now),
                    NetEvent::Failed { id, document_error } => {
                        tracker.request_finished(&id, now);
                        if let Some(error) = document_error {
                            tracker.document_failed(error);
                        }
                    }
                }
            }
        });

        Ok(Self { tracker, pump })
    }

    /// Error text of a failed top-level document load, if any.
    pub fn document_error(&self) -> Option<String> {
        self.tracker
            .lock()
            .ok()
            .and_then(|t| t.document_error().map(str::to_string))
    }

    /// Poll until the quiet window has elapsed with nothing in flight.
    ///
    /// Fails with [`AppError::Navigation`] as soon as a document failure has
    /// been pumped, including one that lands after `goto` returned.
    pub async fn wait_for_idle(&self, window: Duration, budget: Duration) -> Result<(), AppError> {
        let deadline = Instant::now() + budget;
        loop {
            let now = Instant::now();
            let (settled, in_flight) = {
                let tracker = self
                    .tracker
                    .lock()
                    .map_err(|_| AppError::Navigation("Network tracker poisoned".into()))?;
                let settled = tracker
                    .settled(now, window)
                    .map_err(|error| AppError::Navigation(error.to_string()));
                (settled, tracker.in_flight())
            };
            if settled? {
                tracing::debug!("Network idle");
                return Ok(());
            }
            if now >= deadline {
                tracing::warn!(in_flight, "Network never went idle");
                return Err(AppError::Timeout(budget.as_secs()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    pub fn shutdown(&self) {
        self.pump.abort();
    }
}
