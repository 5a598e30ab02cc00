use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::config::BrowserSettings;
use crate::error::AppError;
use crate::locator::Locator;
use crate::models::{ElementProbe, Status};

/// Starts a browser and hands back a single-tab session.
pub trait SessionLauncher: Send + Sync {
    type Session: PageSession;

    fn launch(
        &self,
        settings: &BrowserSettings,
    ) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}

/// One browser tab owned for the duration of a run.
///
/// `close` consumes the session, so it can only be released once.
pub trait PageSession: Send + Sync {
    /// Navigate and wait for the load event followed by network idle.
    fn navigate(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Resolve the locator against the current DOM and sample its first match.
    fn probe(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = Result<ElementProbe, AppError>> + Send;

    /// Click the centre of the first match without waiting for it to settle.
    ///
    /// Returns `false` when the locator matched nothing.
    fn force_click(&self, locator: &Locator)
    -> impl Future<Output = Result<bool, AppError>> + Send;

    /// Serialized HTML of the current document.
    fn content(&self) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Capture a full-page PNG to `path`.
    fn screenshot(&self, path: &Path) -> impl Future<Output = Result<(), AppError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Receives the human-readable status lines of a run.
pub trait StatusSink: Send + Sync {
    fn emit(&self, status: Status, message: &str);
}

/// Prints `STATUS: message` lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StatusSink for StdoutSink {
    fn emit(&self, status: Status, message: &str) {
        tracing::debug!(%status, "{message}");
        println!("{status}: {message}");
    }
}
