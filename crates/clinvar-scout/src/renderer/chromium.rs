//! Chromium-based renderer using chromiumoxide.
//!
//! Every `render` call launches its own browser process and closes it
//! before returning, whatever the outcome. [`BrowserSession`] aborts the
//! CDP handler task on drop, and chromiumoxide kills the child process
//! when its `Browser` is dropped, so an unwinding task cannot leak one.

use super::PageRenderer;
use crate::config::{BrowserOptions, USER_AGENT};
use crate::dom::DomSnapshot;
use crate::error::{ExtractError, ExtractResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventResponseReceived, LoaderId, ResourceType,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::{FutureExt, StreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const READY_POLL: Duration = Duration::from_millis(50);

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&PathBuf>) -> Option<PathBuf> {
    // 1. Configured path
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.clone());
        }
        tracing::warn!("configured browser path {} does not exist", path.display());
    }

    // 2. CLINVAR_SCOUT_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("CLINVAR_SCOUT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

fn engine_failure(context: &str) -> impl FnOnce(chromiumoxide::error::CdpError) -> ExtractError + '_ {
    move |e| ExtractError::EngineFailure(format!("{context}: {e}"))
}

/// Chromium-based renderer. Holds only launch options; the browser
/// itself lives inside a single `render` call.
pub struct ChromiumRenderer {
    options: BrowserOptions,
}

impl ChromiumRenderer {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }

    fn browser_config(&self) -> ExtractResult<BrowserConfig> {
        let chrome_path = find_chromium(self.options.chromium_path.as_ref()).ok_or_else(|| {
            ExtractError::EngineFailure("Chromium not found on this host".into())
        })?;
        let (width, height) = self.options.window;

        BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(width, height)
            .launch_timeout(self.options.launch_timeout)
            .request_timeout(self.options.operation_timeout)
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--single-process")
            .arg(format!("--js-flags=--max-old-space-size={}", self.options.js_heap_mb))
            .arg(format!("--user-agent={USER_AGENT}"))
            .build()
            .map_err(|e| ExtractError::EngineFailure(format!("failed to build browser config: {e}")))
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> ExtractResult<DomSnapshot> {
        let start = Instant::now();
        let config = self.browser_config()?;
        let mut session = match tokio::time::timeout(
            self.options.launch_timeout,
            BrowserSession::launch(config),
        )
        .await
        {
            Ok(session) => session?,
            Err(_) => {
                return Err(ExtractError::Timeout(format!(
                    "browser launch exceeded {}ms",
                    self.options.launch_timeout.as_millis()
                )))
            }
        };

        tracing::info!("navigating to {url}");
        let outcome = match tokio::time::timeout(timeout, session.snapshot(url)).await {
            Ok(result) => result,
            Err(_) => Err(ExtractError::Timeout(format!(
                "navigation exceeded {}ms",
                timeout.as_millis()
            ))),
        };

        session.close().await;
        tracing::info!(
            "browser render finished in {:.2}s ({})",
            start.elapsed().as_secs_f64(),
            if outcome.is_ok() { "ok" } else { "failed" }
        );
        outcome
    }
}

/// One launched browser process plus its CDP event loop.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(config: BrowserConfig) -> ExtractResult<Self> {
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(engine_failure("failed to launch Chromium"))?;

        // Spawn the handler task
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser, handler })
    }

    /// Load `url` up to `DOMContentLoaded` and serialize the live DOM.
    async fn snapshot(&self, url: &str) -> ExtractResult<DomSnapshot> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(engine_failure("failed to create page"))?;

        let result = load(&page, url).await;
        let _ = page.close().await;
        result
    }

    /// Close the browser, killing it if a graceful close fails.
    async fn close(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("browser close failed, killing: {e}");
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::warn!("browser kill failed: {e}");
            }
        }
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("waiting for browser exit failed: {e}");
        }
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn load(page: &Page, url: &str) -> ExtractResult<DomSnapshot> {
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(engine_failure("failed to subscribe to network events"))?;

    let nav = page
        .execute(NavigateParams::new(url))
        .await
        .map_err(|e| ExtractError::LoadFailed(format!("navigation to {url} failed: {e}")))?;
    if let Some(error_text) = nav.result.error_text.as_deref() {
        return Err(ExtractError::LoadFailed(format!(
            "no response from {url}: {error_text}"
        )));
    }

    wait_for_dom(page).await?;

    let status = match document_status(&mut responses, nav.result.loader_id.as_ref()) {
        Some(status) => Some(status),
        None => timing_status(page).await?,
    };
    check_status(url, status)?;

    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| url.to_string());
    let html = page
        .content()
        .await
        .map_err(engine_failure("failed to read DOM"))?;
    Ok(DomSnapshot::new(final_url, html))
}

/// A navigation needs a reported status below 400.
fn check_status(url: &str, status: Option<u16>) -> ExtractResult<()> {
    match status {
        Some(status) if status >= 400 => {
            tracing::warn!("failed to load {url} properly: status {status}");
            Err(ExtractError::LoadFailed(format!("status {status} from {url}")))
        }
        Some(_) => Ok(()),
        None => Err(ExtractError::LoadFailed(format!(
            "no response status reported for {url}"
        ))),
    }
}

/// Status of the main document response among the network events that
/// have already arrived. Redirect hops never reach `responseReceived`.
fn document_status(
    responses: &mut EventStream<EventResponseReceived>,
    loader: Option<&LoaderId>,
) -> Option<u16> {
    let mut status = None;
    while let Some(Some(event)) = responses.next().now_or_never() {
        if event.r#type != ResourceType::Document {
            continue;
        }
        if loader.is_some_and(|id| *id != event.loader_id) {
            continue;
        }
        status = u16::try_from(event.response.status).ok();
        break;
    }
    status
}

/// Poll until the parser has finished building the initial DOM.
async fn wait_for_dom(page: &Page) -> ExtractResult<()> {
    loop {
        let state: String = page
            .evaluate("document.readyState")
            .await
            .map_err(engine_failure("readyState query failed"))?
            .into_value()
            .map_err(|e| ExtractError::EngineFailure(format!("bad readyState value: {e}")))?;
        if state != "loading" {
            return Ok(());
        }
        tokio::time::sleep(READY_POLL).await;
    }
}

/// HTTP status of the main document from its Navigation Timing entry;
/// `None` when the entry carries none.
async fn timing_status(page: &Page) -> ExtractResult<Option<u16>> {
    let script = "(() => { const e = performance.getEntriesByType('navigation')[0]; \
                  return e && e.responseStatus ? e.responseStatus : null; })()";
    page.evaluate(script)
        .await
        .map_err(engine_failure("navigation status query failed"))?
        .into_value::<Option<u16>>()
        .map_err(|e| ExtractError::EngineFailure(format!("bad navigation status value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_is_not_returned() {
        let bogus = PathBuf::from("/definitely/not/a/browser");
        assert_ne!(find_chromium(Some(&bogus)), Some(bogus));
    }

    #[test]
    fn test_missing_or_error_status_is_load_failure() {
        let url = "https://www.ncbi.nlm.nih.gov/clinvar/variation/1/";
        assert!(check_status(url, Some(200)).is_ok());
        assert!(check_status(url, Some(304)).is_ok());
        for status in [None, Some(404), Some(503)] {
            let err = check_status(url, status).unwrap_err();
            assert!(matches!(err, ExtractError::LoadFailed(_)), "{status:?}: {err:?}");
        }
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_render_served_page() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clinvar/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                b"<title>T</title><h1>Hello</h1><table><tr><td>Gene</td><td>BRCA1</td></tr></table>"
                    .to_vec(),
                "text/html",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clinvar/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_raw(b"<p>gone</p>".to_vec(), "text/html"))
            .mount(&server)
            .await;

        let renderer = ChromiumRenderer::new(BrowserOptions::default());
        let snapshot = renderer
            .render(&format!("{}/clinvar/ok", server.uri()), Duration::from_secs(20))
            .await
            .expect("render failed");
        assert!(snapshot.html.contains("<h1>Hello</h1>"));
        assert!(snapshot.html.contains("BRCA1"));

        let err = renderer
            .render(&format!("{}/clinvar/missing", server.uri()), Duration::from_secs(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::LoadFailed(_)), "{err:?}");
    }
}
