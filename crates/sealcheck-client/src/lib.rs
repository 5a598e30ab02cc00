pub mod browser;
pub mod network;
mod scripts;

pub use browser::{ChromiumLauncher, ChromiumSession};
pub use network::{IdleTracker, NetworkMonitor};
