use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use crate::config::VerifyConfig;
use crate::error::AppError;
use crate::models::{CheckId, CheckOutcome, Report, Status, Target};
use crate::traits::{PageSession, SessionLauncher, StatusSink};
use crate::util::{content_snippet, quote_markers};

/// Characters of page content dumped when no marker is found.
const SNIPPET_CHARS: usize = 500;

/// Drives one intro run: load → assert shown → click → assert faded → assert main view.
///
/// Generic over the browser and the console via traits, so the whole sequence
/// can be exercised against a scripted session.
pub struct IntroVerifier<L, S>
where
    L: SessionLauncher,
    S: StatusSink,
{
    launcher: L,
    sink: S,
    config: VerifyConfig,
}

impl<L, S> IntroVerifier<L, S>
where
    L: SessionLauncher,
    S: StatusSink,
{
    pub fn new(launcher: L, sink: S, config: VerifyConfig) -> Self {
        Self {
            launcher,
            sink,
            config,
        }
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Run every check and return the report.
    ///
    /// Returns `Err` only for setup failures (config, launch, navigation);
    /// failed checks are recorded in the report. Once launched, the session is
    /// closed exactly once whichever way this returns.
    pub async fn run(&self) -> Result<Report, AppError> {
        self.config.validate()?;
        let started_at = Utc::now();

        tracing::info!(headless = self.config.browser.headless, "Launching browser");
        let session = self.launcher.launch(&self.config.browser).await?;

        let outcome = self.drive(&session).await;

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close browser: {e}");
        }

        let (checks, screenshots) = outcome?;
        let report = Report {
            run_id: Uuid::new_v4(),
            url: self.config.url.clone(),
            started_at,
            finished_at: Utc::now(),
            checks,
            screenshots,
        };

        self.say(
            Status::Info,
            &format!(
                "{}/{} checks passed",
                report.passed_count(),
                report.checks.len()
            ),
        );
        tracing::info!(run_id = %report.run_id, passed = report.all_passed(), "Run complete");

        Ok(report)
    }

    async fn drive(
        &self,
        session: &L::Session,
    ) -> Result<(Vec<CheckOutcome>, Vec<PathBuf>), AppError> {
        let config = &self.config;
        let mut checks = Vec::with_capacity(5);
        let mut screenshots = Vec::with_capacity(2);

        self.say(Status::Info, &format!("Navigating to {}...", config.url));
        session
            .navigate(&config.url, config.browser.navigation_timeout)
            .await?;
        self.say(Status::Info, "Page loaded.");

        checks.push(
            self.check_visible(session, &config.hint, CheckId::HintVisibleInitially)
                .await,
        );
        checks.push(
            self.check_visible(session, &config.seal, CheckId::SealVisibleInitially)
                .await,
        );

        self.capture(session, &config.initial_screenshot(), &mut screenshots)
            .await;

        self.click(session, &config.seal).await;
        tokio::time::sleep(config.timings.settle).await;

        checks.push(
            self.check_hidden(session, &config.hint, CheckId::HintHiddenAfterClick)
                .await,
        );
        checks.push(
            self.check_hidden(session, &config.seal, CheckId::SealHiddenAfterClick)
                .await,
        );

        self.say(Status::Info, "Waiting for intro animation to finish...");
        tokio::time::sleep(config.timings.finish).await;

        checks.push(self.check_main_view(session).await);

        self.capture(session, &config.final_screenshot(), &mut screenshots)
            .await;

        Ok((checks, screenshots))
    }

    async fn check_visible(&self, session: &L::Session, target: &Target, id: CheckId) -> CheckOutcome {
        let name = &target.name;
        match session.probe(&target.locator).await {
            Ok(probe) if probe.is_present() && probe.visible => {
                self.pass(id, format!("{name} is visible initially."))
            }
            Ok(probe) if !probe.is_present() => self.fail(
                id,
                format!(
                    "{name} is NOT visible initially (no element matches `{}`).",
                    target.locator
                ),
            ),
            Ok(_) => self.fail(id, format!("{name} is NOT visible initially.")),
            Err(e) => self.fail(id, format!("{name} could not be checked: {e}")),
        }
    }

    async fn check_hidden(&self, session: &L::Session, target: &Target, id: CheckId) -> CheckOutcome {
        let name = &target.name;
        let probe = match session.probe(&target.locator).await {
            Ok(probe) => probe,
            Err(e) => return self.fail(id, format!("{name} could not be checked: {e}")),
        };
        tracing::debug!(?probe, locator = %target.locator, "Post-click probe");

        if !probe.is_present() || !probe.visible {
            return self.pass(id, format!("{name} disappeared after click."));
        }

        // Still laid out and on screen: the fade may not have settled yet.
        let inherited = self.config.inherit_opacity;
        let sample = probe.opacity_sample(inherited);
        let outcome = match sample {
            Some(opacity) => {
                self.say(Status::Info, &format!("{name} opacity is {opacity}"));
                if probe.is_hidden(self.config.opacity_threshold, inherited) {
                    self.pass(id, format!("{name} opacity is near 0."))
                } else {
                    self.fail(id, format!("{name} is still visible."))
                }
            }
            None => self.fail(id, format!("{name} is still visible.")),
        };
        outcome.with_opacity(sample)
    }

    async fn check_main_view(&self, session: &L::Session) -> CheckOutcome {
        let id = CheckId::MainViewEntered;
        let content = match session.content().await {
            Ok(content) => content,
            Err(e) => return self.fail(id, format!("Could not read page content: {e}")),
        };

        let markers: Vec<&str> = self
            .config
            .markers
            .iter()
            .map(String::as_str)
            .filter(|m| !m.trim().is_empty())
            .collect();
        let found = markers.iter().find(|m| content.contains(**m));

        match found {
            Some(marker) => {
                tracing::debug!(%marker, "Main view marker found");
                self.pass(id, "Entered main experience.")
            }
            None => {
                let message = format!(
                    "Could not detect {} text. Dumping content snippet:",
                    quote_markers(&markers)
                );
                self.say(Status::Warning, &message);
                self.say(Status::Info, content_snippet(&content, SNIPPET_CHARS));
                CheckOutcome::fail(id, message)
            }
        }
    }

    async fn click(&self, session: &L::Session, target: &Target) {
        let name = &target.name;
        self.say(
            Status::Info,
            &format!("Clicking the {}...", name.to_lowercase()),
        );
        match session.force_click(&target.locator).await {
            Ok(true) => {}
            Ok(false) => self.say(
                Status::Warning,
                &format!(
                    "Could not click {name}: no element matches `{}`.",
                    target.locator
                ),
            ),
            Err(e) => self.say(Status::Warning, &format!("Could not click {name}: {e}")),
        }
    }

    async fn capture(&self, session: &L::Session, path: &Path, saved: &mut Vec<PathBuf>) {
        match session.screenshot(path).await {
            Ok(()) => {
                self.say(
                    Status::Info,
                    &format!("Screenshot saved to {}", path.display()),
                );
                saved.push(path.to_path_buf());
            }
            Err(e) => self.say(
                Status::Warning,
                &format!("Could not save screenshot {}: {e}", path.display()),
            ),
        }
    }

    fn pass(&self, id: CheckId, detail: impl Into<String>) -> CheckOutcome {
        let outcome = CheckOutcome::pass(id, detail);
        self.say(Status::Success, &outcome.detail);
        outcome
    }

    fn fail(&self, id: CheckId, detail: impl Into<String>) -> CheckOutcome {
        let outcome = CheckOutcome::fail(id, detail);
        self.say(Status::Failure, &outcome.detail);
        outcome
    }

    fn say(&self, status: Status, message: &str) {
        self.sink.emit(status, message);
    }
}
