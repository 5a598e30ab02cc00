use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sealcheck_client::ChromiumLauncher;
use sealcheck_core::config::{DEFAULT_HINT, DEFAULT_MARKERS, DEFAULT_SEAL, DEFAULT_URL};
use sealcheck_core::{
    AppError, BrowserSettings, IntroVerifier, Locator, Report, StdoutSink, Target, Timings,
    VerifyConfig, Viewport,
};

/// Every check passed.
const EXIT_PASSED: u8 = 0;
/// At least one check failed.
const EXIT_CHECKS_FAILED: u8 = 1;
/// Nothing was asserted: bad config, browser launch or navigation failed.
const EXIT_SETUP_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "sealcheck",
    version,
    about = "Smoke-test the envelope intro animation in a headless browser"
)]
struct Cli {
    /// Page to open (must already be served)
    #[arg(short, long, env = "SEALCHECK_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Directory for debug_initial.png / debug_final.png
    #[arg(short, long, env = "SEALCHECK_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Show the browser window instead of running headless
    #[arg(long, env = "SEALCHECK_HEADED", default_value_t = false)]
    headed: bool,

    /// Window size as WIDTHxHEIGHT (<=768 wide renders the mobile layout)
    #[arg(long, env = "SEALCHECK_VIEWPORT", default_value = "1280x720")]
    viewport: Viewport,

    /// Locator for the "click to open" hint
    #[arg(long, env = "SEALCHECK_HINT", default_value = DEFAULT_HINT)]
    hint: Locator,

    /// Locator for the wax seal button that gets clicked
    #[arg(long, env = "SEALCHECK_SEAL", default_value = DEFAULT_SEAL)]
    seal: Locator,

    /// Text that proves the main view loaded (repeatable; any one suffices)
    #[arg(long = "marker", value_name = "TEXT")]
    markers: Vec<String>,

    /// Wait after the click before checking the fade-out
    #[arg(long, env = "SEALCHECK_SETTLE_MS", default_value_t = 1000)]
    settle_ms: u64,

    /// Further wait before looking for the main view
    #[arg(long, env = "SEALCHECK_FINISH_MS", default_value_t = 3000)]
    finish_ms: u64,

    /// Elements fainter than this count as hidden
    #[arg(long, env = "SEALCHECK_OPACITY_THRESHOLD", default_value_t = 0.1)]
    opacity_threshold: f64,

    /// Judge the fade on opacity inherited from ancestors, not the element's own
    #[arg(long, env = "SEALCHECK_INHERIT_OPACITY", default_value_t = false)]
    inherit_opacity: bool,

    /// Capture the whole scrollable page instead of the viewport
    #[arg(long, env = "SEALCHECK_FULL_PAGE", default_value_t = false)]
    full_page: bool,

    /// Upper bound for page load plus network idle
    #[arg(long, env = "SEALCHECK_NAVIGATION_TIMEOUT", default_value_t = 30)]
    navigation_timeout_secs: u64,

    /// Write the structured report as JSON to this path
    #[arg(long, env = "SEALCHECK_REPORT")]
    report: Option<PathBuf>,

    /// Chrome/Chromium binary (auto-detected when omitted)
    #[arg(long, env = "CHROME_BIN")]
    chrome_bin: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> VerifyConfig {
        let markers = if self.markers.is_empty() {
            DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect()
        } else {
            self.markers
        };

        VerifyConfig {
            url: self.url,
            output_dir: self.output_dir,
            hint: Target::new("Click hint", self.hint),
            seal: Target::new("Wax seal", self.seal),
            markers,
            opacity_threshold: self.opacity_threshold,
            inherit_opacity: self.inherit_opacity,
            timings: Timings {
                settle: Duration::from_millis(self.settle_ms),
                finish: Duration::from_millis(self.finish_ms),
            },
            browser: BrowserSettings {
                headless: !self.headed,
                viewport: self.viewport,
                chrome_bin: self.chrome_bin,
                navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
                full_page_screenshots: self.full_page,
                ..BrowserSettings::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    if let Err(e) = init_tracing() {
        eprintln!("error: {e:#}");
        return ExitCode::from(EXIT_SETUP_FAILED);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) if report.all_passed() => ExitCode::from(EXIT_PASSED),
        Ok(_) => ExitCode::from(EXIT_CHECKS_FAILED),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_SETUP_FAILED)
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sealcheck=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run(cli: Cli) -> Result<Report> {
    let report_path = cli.report.clone();
    let config = cli.into_config();

    let verifier = IntroVerifier::new(ChromiumLauncher, StdoutSink, config);
    let report = verifier
        .run()
        .await
        .map_err(|e: AppError| anyhow::anyhow!(e))
        .with_context(|| format!("Intro verification of {} aborted", verifier.config().url))?;

    if let Some(path) = report_path {
        // A missing report file is an artifact problem, not a failed run.
        if let Err(e) = write_report(&report, &path) {
            tracing::warn!("{e:#}");
        }
    }

    Ok(report)
}

fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}
