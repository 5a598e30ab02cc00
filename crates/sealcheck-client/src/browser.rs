use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport as CdpViewport;
use chromiumoxide::layout::Point;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use sealcheck_core::config::BrowserSettings;
use sealcheck_core::error::AppError;
use sealcheck_core::traits::{PageSession, SessionLauncher};
use sealcheck_core::{ElementProbe, Locator};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;

use crate::network::NetworkMonitor;
use crate::scripts::{self, ClickTarget};

/// Launches headless Chromium via the Chrome DevTools Protocol.
///
/// Each [`SessionLauncher::launch`] call starts its own Chromium process with
/// one blank tab that already listens for network events, so the first
/// navigation is tracked from its very first request.
///
/// # Example
///
/// ```rust,no_run
/// use sealcheck_client::ChromiumLauncher;
/// use sealcheck_core::{IntroVerifier, StdoutSink, VerifyConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let verifier = IntroVerifier::new(ChromiumLauncher, StdoutSink, VerifyConfig::default());
/// let report = verifier.run().await?;
/// println!("{}/{} passed", report.passed_count(), report.checks.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// On systems where Chromium is installed via **snap**, the wrapper at
    /// `/snap/bin/chromium` strips unknown CLI flags, breaking headless mode.
    /// We look for the real binary inside the snap first, then fall back to
    /// well-known system paths.  If nothing is found we return `None` and let
    /// `chromiumoxide` do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            // Snap (Ubuntu default)
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            // Flatpak
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            // Common apt / manual installs
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    fn config(settings: &BrowserSettings) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        let explicit = settings.chrome_bin.clone().filter(|p| {
            let found = p.exists();
            if !found {
                tracing::warn!("Chrome binary {} not found, auto-detecting", p.display());
            }
            found
        });
        let bin = explicit.or_else(Self::find_chrome_binary);
        if let Some(bin) = bin {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let width = settings.viewport.width;
        let height = settings.viewport.height;
        builder = builder.window_size(width, height).viewport(CdpViewport {
            width,
            height,
            ..CdpViewport::default()
        });

        builder = if settings.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::BrowserLaunch(format!("Browser config error: {e}")))
    }
}

impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self, settings: &BrowserSettings) -> Result<ChromiumSession, AppError> {
        let config = Self::config(settings)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserLaunch(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let opened = async {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| AppError::BrowserLaunch(format!("Failed to open tab: {e}")))?;
            let network = NetworkMonitor::attach(&page).await?;
            Ok::<_, AppError>((page, network))
        }
        .await;

        match opened {
            Ok((page, network)) => Ok(ChromiumSession {
                browser,
                page,
                network,
                handler,
                idle_window: settings.idle_window,
                full_page: settings.full_page_screenshots,
            }),
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                Err(e)
            }
        }
    }
}

/// A Chromium process with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    network: NetworkMonitor,
    handler: JoinHandle<()>,
    idle_window: Duration,
    full_page: bool,
}

impl ChromiumSession {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, AppError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(AppError::Script)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| AppError::Script(e.to_string()))?;

        Ok(result.into_value()?)
    }
}

impl PageSession for ChromiumSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), AppError> {
        let started = Instant::now();

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(AppError::Navigation(format!(
                    "Failed to navigate to {url}: {e}"
                )));
            }
            Err(_) => return Err(AppError::Timeout(timeout.as_secs())),
        }

        if let Some(error) = self.network.document_error() {
            return Err(AppError::Navigation(format!(
                "Failed to load {url}: {error}"
            )));
        }

        let remaining = timeout.saturating_sub(started.elapsed());
        self.network
            .wait_for_idle(self.idle_window, remaining)
            .await
            .map_err(|e| match e {
                AppError::Timeout(_) => AppError::Timeout(timeout.as_secs()),
                AppError::Navigation(error) => {
                    AppError::Navigation(format!("Failed to load {url}: {error}"))
                }
                other => other,
            })?;

        tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Page settled");
        Ok(())
    }

    async fn probe(&self, locator: &Locator) -> Result<ElementProbe, AppError> {
        let probe: ElementProbe = self.eval(scripts::probe(locator)?).await?;
        tracing::debug!(%locator, ?probe, "Probed element");
        Ok(probe)
    }

    async fn force_click(&self, locator: &Locator) -> Result<bool, AppError> {
        let target: ClickTarget = self.eval(scripts::click_target(locator)?).await?;
        if !target.found {
            return Ok(false);
        }

        self.page
            .click(Point {
                x: target.x,
                y: target.y,
            })
            .await
            .map_err(|e| AppError::Script(format!("Click on {locator} failed: {e}")))?;

        tracing::debug!(%locator, x = target.x, y = target.y, "Clicked");
        Ok(true)
    }

    async fn content(&self) -> Result<String, AppError> {
        self.page
            .content()
            .await
            .map_err(|e| AppError::Script(format!("Failed to read page content: {e}")))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(self.full_page)
            .build();

        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| AppError::Screenshot(format!("{}: {e}", path.display())))?;

        Ok(())
    }

    async fn close(self) -> Result<(), AppError> {
        let ChromiumSession {
            mut browser,
            network,
            handler,
            ..
        } = self;

        network.shutdown();
        let closed = browser
            .close()
            .await
            .map_err(|e| AppError::BrowserLaunch(format!("Failed to close browser: {e}")));
        let _ = browser.wait().await;
        handler.abort();

        tracing::debug!("Browser closed");
        closed.map(|_| ())
    }
}
