use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::response::Html;
use axum::routing::get;
use sealcheck_core::{Status, StatusSink, Timings, VerifyConfig};
use tokio::net::TcpListener;

/// Envelope intro: hint + seal fade out on click, then the main view mounts.
///
/// The marker text is assembled at runtime so the serialised script never
/// contains it.
pub const INTRO_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>intro fixture</title></head>
<body style="margin:0">
  <div id="intro" style="position:fixed;inset:0">
    <p id="click_hint" style="transition:opacity 300ms linear">点击开启</p>
    <button id="seal" style="transition:opacity 300ms linear;animation:pulse 1s infinite">HNU</button>
  </div>
  <main id="main"></main>
  <style>@keyframes pulse { from { transform: scale(1); } to { transform: scale(1.05); } }</style>
  <script>
    document.getElementById('seal').addEventListener('click', () => {
      document.getElementById('click_hint').style.opacity = '0';
      document.getElementById('seal').style.opacity = '0';
      setTimeout(() => {
        document.getElementById('intro').remove();
        const heading = document.createElement('h1');
        heading.textContent = ['Desktop', 'View'].join(' ');
        document.getElementById('main').append(heading);
      }, 800);
    });
  </script>
</body>
</html>"#;

/// Only the wrapping container fades; the hint and seal keep opacity 1.
pub const CONTAINER_FADE_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>container fade fixture</title></head>
<body style="margin:0">
  <div id="intro" style="position:fixed;inset:0;transition:opacity 300ms linear">
    <p id="click_hint">点击开启</p>
    <button id="seal">HNU</button>
  </div>
  <script>
    document.getElementById('seal').addEventListener('click', () => {
      document.getElementById('intro').style.opacity = '0';
    });
  </script>
</body>
</html>"#;

/// The seal ignores clicks, so nothing fades and the main view never mounts.
pub const STUCK_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>stuck fixture</title></head>
<body style="margin:0">
  <p id="click_hint">点击开启</p>
  <button id="seal">HNU</button>
</body>
</html>"#;

/// A page that never renders the intro at all.
pub const EMPTY_PAGE: &str = "<!doctype html><html><body><p>nothing here</p></body></html>";

/// Serve the fixture pages on an ephemeral localhost port.
pub async fn serve_fixture() -> anyhow::Result<SocketAddr> {
    let app = Router::new()
        .route("/", get(|| async { Html(INTRO_PAGE) }))
        .route("/container", get(|| async { Html(CONTAINER_FADE_PAGE) }))
        .route("/stuck", get(|| async { Html(STUCK_PAGE) }))
        .route("/empty", get(|| async { Html(EMPTY_PAGE) }));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind fixture server")?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

pub fn fixture_config(url: String, output_dir: &std::path::Path) -> VerifyConfig {
    VerifyConfig {
        url,
        output_dir: output_dir.to_path_buf(),
        timings: Timings {
            settle: Duration::from_millis(500),
            finish: Duration::from_millis(1500),
        },
        ..Default::default()
    }
}

/// Keeps every `STATUS: message` line for assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, status: Status, message: &str) {
        self.lines.lock().unwrap().push(format!("{status}: {message}"));
    }
}
