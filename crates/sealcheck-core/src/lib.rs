pub mod config;
pub mod error;
pub mod locator;
pub mod models;
pub mod traits;
pub mod util;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{BrowserSettings, Timings, VerifyConfig, Viewport};
pub use error::AppError;
pub use locator::Locator;
pub use models::{CheckId, CheckOutcome, ElementProbe, Report, Status, Target};
pub use traits::{PageSession, SessionLauncher, StatusSink, StdoutSink};
pub use verify::IntroVerifier;
