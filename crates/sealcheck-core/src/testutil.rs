//! Test utilities: mock implementations of the session traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls after the session has been consumed.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{BrowserSettings, VerifyConfig};
use crate::error::AppError;
use crate::locator::Locator;
use crate::models::{ElementProbe, Status};
use crate::traits::{PageSession, SessionLauncher, StatusSink};

// ---------------------------------------------------------------------------
// MockSession
// ---------------------------------------------------------------------------

#[derive(Default)]
struct SessionState {
    /// Per-locator probe results, consumed front to back.
    probes: HashMap<String, VecDeque<Result<ElementProbe, AppError>>>,
    content: String,
    navigate_error: Option<AppError>,
    screenshot_failure: Option<String>,
    content_failure: Option<String>,
    clicks: usize,
    close_count: usize,
}

/// Scripted page session.
///
/// Locators with no (remaining) scripted probes resolve to zero matches.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<SessionState>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default hint and seal are shown, then fade/unmount after the
    /// click, and the main view renders.
    pub fn intro_that_opens() -> Self {
        let config = VerifyConfig::default();
        Self::new()
            .with_probes(
                &config.hint.locator,
                vec![ElementProbe::shown(), ElementProbe::absent()],
            )
            .with_probes(
                &config.seal.locator,
                vec![ElementProbe::shown(), ElementProbe::with_opacity(true, 0.03)],
            )
            .with_content("<html><body><h1>Desktop View</h1></body></html>")
    }

    pub fn with_probes(self, locator: &Locator, probes: Vec<ElementProbe>) -> Self {
        self.with_probe_results(locator, probes.into_iter().map(Ok).collect())
    }

    pub fn with_probe_results(
        self,
        locator: &Locator,
        results: Vec<Result<ElementProbe, AppError>>,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .probes
            .insert(locator.to_string(), results.into());
        self
    }

    pub fn with_content(self, html: &str) -> Self {
        self.state.lock().unwrap().content = html.to_string();
        self
    }

    pub fn with_navigate_error(self, error: AppError) -> Self {
        self.state.lock().unwrap().navigate_error = Some(error);
        self
    }

    /// Every screenshot call fails with this message.
    pub fn with_screenshot_failure(self, message: &str) -> Self {
        self.state.lock().unwrap().screenshot_failure = Some(message.to_string());
        self
    }

    /// Every content read fails with this message.
    pub fn with_content_error(self, message: &str) -> Self {
        self.state.lock().unwrap().content_failure = Some(message.to_string());
        self
    }

    pub fn clicks(&self) -> usize {
        self.state.lock().unwrap().clicks
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }
}

impl PageSession for MockSession {
    async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<(), AppError> {
        match self.state.lock().unwrap().navigate_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementProbe, AppError> {
        let mut state = self.state.lock().unwrap();
        state
            .probes
            .get_mut(&locator.to_string())
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(ElementProbe::absent()))
    }

    async fn force_click(&self, locator: &Locator) -> Result<bool, AppError> {
        let mut state = self.state.lock().unwrap();
        state.clicks += 1;
        let present = state
            .probes
            .get(&locator.to_string())
            .and_then(|queue| queue.front())
            .is_some_and(|next| matches!(next, Ok(probe) if probe.is_present()));
        Ok(present)
    }

    async fn content(&self) -> Result<String, AppError> {
        let state = self.state.lock().unwrap();
        match &state.content_failure {
            Some(message) => Err(AppError::Script(message.clone())),
            None => Ok(state.content.clone()),
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        if let Some(message) = self.state.lock().unwrap().screenshot_failure.clone() {
            return Err(AppError::Screenshot(message));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"\x89PNG\r\n\x1a\n")?;
        Ok(())
    }

    async fn close(self) -> Result<(), AppError> {
        self.state.lock().unwrap().close_count += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockLauncher
// ---------------------------------------------------------------------------

/// Launcher that hands out clones of one scripted session.
#[derive(Clone)]
pub struct MockLauncher {
    session: MockSession,
    error: Arc<Mutex<Option<AppError>>>,
    launches: Arc<Mutex<usize>>,
}

impl MockLauncher {
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            error: Arc::new(Mutex::new(None)),
            launches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            session: MockSession::new(),
            error: Arc::new(Mutex::new(Some(error))),
            launches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn launches(&self) -> usize {
        *self.launches.lock().unwrap()
    }
}

impl SessionLauncher for MockLauncher {
    type Session = MockSession;

    async fn launch(&self, _settings: &BrowserSettings) -> Result<MockSession, AppError> {
        *self.launches.lock().unwrap() += 1;
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.session.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Sink that keeps every `STATUS: message` line for assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, status: Status, message: &str) {
        self.lines.lock().unwrap().push(format!("{status}: {message}"));
    }
}
