use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::AppError;
use crate::locator::Locator;
use crate::models::Target;

pub const DEFAULT_URL: &str = "http://localhost:3000";
pub const DEFAULT_HINT: &str = "text=点击开启";
pub const DEFAULT_SEAL: &str = "button:has-text(\"HNU\")";
pub const DEFAULT_MARKERS: [&str; 2] = ["Desktop View", "Mobile View"];
pub const DEFAULT_OPACITY_THRESHOLD: f64 = 0.1;

pub const INITIAL_SCREENSHOT: &str = "debug_initial.png";
pub const FINAL_SCREENSHOT: &str = "debug_final.png";

/// Browser window size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl FromStr for Viewport {
    type Err = AppError;

    /// Parses `WIDTHxHEIGHT`, e.g. `1280x720`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::ConfigError(format!("Invalid viewport '{raw}': expected WxH"));
        let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(AppError::ConfigError(format!(
                "Invalid viewport '{raw}': dimensions must be at least 1"
            )));
        }
        Ok(Self { width, height })
    }
}

/// How the browser is launched and how long navigation may take.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub viewport: Viewport,
    /// Explicit Chrome/Chromium binary; auto-detected when `None`.
    pub chrome_bin: Option<PathBuf>,
    /// Upper bound for load + network idle.
    pub navigation_timeout: Duration,
    /// Quiet window with no in-flight requests that counts as network idle.
    pub idle_window: Duration,
    /// Capture the whole scrollable page instead of just the viewport.
    pub full_page_screenshots: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            chrome_bin: None,
            navigation_timeout: Duration::from_secs(30),
            idle_window: Duration::from_millis(500),
            full_page_screenshots: false,
        }
    }
}

/// Fixed waits around the click.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Wait after the click before asserting the fade-out.
    pub settle: Duration,
    /// Further wait before looking for the main view.
    pub finish: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            finish: Duration::from_secs(3),
        }
    }
}

/// Everything one intro run needs.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub url: String,
    pub output_dir: PathBuf,
    pub hint: Target,
    pub seal: Target,
    /// Any one of these in the page content means the main view loaded.
    pub markers: Vec<String>,
    pub opacity_threshold: f64,
    /// Judge the fade on the product of opacity up the ancestor chain rather
    /// than the element's own computed opacity.
    pub inherit_opacity: bool,
    pub timings: Timings,
    pub browser: BrowserSettings,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            output_dir: PathBuf::from("."),
            hint: Target::new("Click hint", Locator::text("点击开启")),
            seal: Target::new("Wax seal", Locator::has_text("button", "HNU")),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            opacity_threshold: DEFAULT_OPACITY_THRESHOLD,
            inherit_opacity: false,
            timings: Timings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl VerifyConfig {
    /// Reject values that would make the run meaningless.
    pub fn validate(&self) -> Result<(), AppError> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| AppError::ConfigError(format!("Invalid URL '{}': {e}", self.url)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::ConfigError(format!(
                    "URL scheme '{scheme}' is not allowed (only http/https)"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.opacity_threshold) {
            return Err(AppError::ConfigError(format!(
                "Opacity threshold {} must be within [0, 1]",
                self.opacity_threshold
            )));
        }

        if self.markers.iter().all(|m| m.trim().is_empty()) {
            return Err(AppError::ConfigError(
                "At least one non-empty marker label is required".into(),
            ));
        }

        if self.browser.navigation_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "Navigation timeout must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    pub fn initial_screenshot(&self) -> PathBuf {
        self.output_dir.join(INITIAL_SCREENSHOT)
    }

    pub fn final_screenshot(&self) -> PathBuf {
        self.output_dir.join(FINAL_SCREENSHOT)
    }
}
