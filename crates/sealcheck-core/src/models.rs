use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::locator::Locator;

/// A named element the verifier asserts on (e.g. "Click hint").
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Human-readable name used in status lines.
    pub name: String,
    pub locator: Locator,
}

impl Target {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }
}

/// Snapshot of a locator resolved against the live DOM.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementProbe {
    /// Number of elements the locator resolved to.
    pub matches: usize,
    /// First match passes the visible-in-viewport test.
    pub visible: bool,
    /// First match's own computed opacity.
    pub opacity: Option<f64>,
    /// Product of computed opacity over the first match and its ancestors.
    pub effective_opacity: Option<f64>,
}

impl ElementProbe {
    /// A locator that matched nothing.
    pub fn absent() -> Self {
        Self::default()
    }

    /// A single visible, fully opaque match.
    pub fn shown() -> Self {
        Self::with_opacity(true, 1.0)
    }

    /// A single match with the given visibility and computed opacity, no faded ancestor.
    pub fn with_opacity(visible: bool, opacity: f64) -> Self {
        Self {
            matches: 1,
            visible,
            opacity: Some(opacity),
            effective_opacity: Some(opacity),
        }
    }

    pub fn is_present(&self) -> bool {
        self.matches > 0
    }

    /// Opacity used for the hidden test: the element's own computed value, or
    /// the ancestor product when `inherited` is set.
    pub fn opacity_sample(&self, inherited: bool) -> Option<f64> {
        if inherited {
            self.effective_opacity.or(self.opacity)
        } else {
            self.opacity
        }
    }

    /// Hidden if absent, not visible, or faded below `threshold`.
    pub fn is_hidden(&self, threshold: f64, inherited: bool) -> bool {
        !self.is_present()
            || !self.visible
            || self.opacity_sample(inherited).is_some_and(|o| o < threshold)
    }
}

/// Severity prefix of a console status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Success,
    Failure,
    Warning,
    Info,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
            Status::Warning => "WARNING",
            Status::Info => "INFO",
        })
    }
}

/// The five checks of an intro run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckId {
    HintVisibleInitially,
    SealVisibleInitially,
    HintHiddenAfterClick,
    SealHiddenAfterClick,
    MainViewEntered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub check: CheckId,
    pub passed: bool,
    /// Message printed for the decisive status line.
    pub detail: String,
    /// Opacity sample taken for the hidden fallback, if one was needed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl CheckOutcome {
    pub fn pass(check: CheckId, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed: true,
            detail: detail.into(),
            opacity: None,
        }
    }

    pub fn fail(check: CheckId, detail: impl Into<String>) -> Self {
        Self {
            check,
            passed: false,
            detail: detail.into(),
            opacity: None,
        }
    }

    pub fn with_opacity(mut self, opacity: Option<f64>) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Structured result of one verifier run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub checks: Vec<CheckOutcome>,
    /// Screenshots that were actually written.
    pub screenshots: Vec<PathBuf>,
}

impl Report {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|c| c.passed)
    }

    pub fn check(&self, id: CheckId) -> Option<&CheckOutcome> {
        self.checks.iter().find(|c| c.check == id)
    }
}
