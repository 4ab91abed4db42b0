//! Chromium-based renderer using chromiumoxide.

use super::idle::InflightTracker;
use super::{ElementShot, NavigationResult, RenderContext, Renderer};
use crate::config::{HarvestConfig, WaitPolicy, CHROMIUM_PATH_ENV};
use crate::error::{NavigationError, ScreenshotError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// How often the idle condition is re-checked while loading.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Extra time CDP requests get beyond the navigation timeout, so a hung page
/// is reported by the navigation timeout rather than by a CDP request.
const CDP_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Per-request CDP timeout for a given wait policy.
pub fn cdp_request_timeout(wait: &WaitPolicy) -> Duration {
    wait.timeout + CDP_TIMEOUT_MARGIN
}

/// Classify a failed `goto`. A CDP request timeout counts as a navigation timeout.
fn goto_error(url: &str, wait: &WaitPolicy, err: CdpError) -> NavigationError {
    match err {
        CdpError::Timeout => NavigationError::Timeout {
            url: url.to_string(),
            timeout_ms: wait.timeout_ms(),
        },
        other => NavigationError::Failed {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Find the Chromium binary path.
pub fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    // 1. configured path (config or STYLE_HARVEST_CHROMIUM_PATH)
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }
    if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.style-harvest/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".style-harvest/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".style-harvest/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
            ]
        } else {
            vec![home.join(".style-harvest/chromium/chrome-linux64/chrome")]
        };
        if let Some(c) = candidates.into_iter().find(|c| c.exists()) {
            return Some(c);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    user_agent: String,
    active_count: Arc<AtomicUsize>,
}

impl ChromiumRenderer {
    /// Launch a headless Chromium instance sized and identified per `config`.
    pub async fn launch(config: &HarvestConfig) -> Result<Self> {
        let chrome_path = find_chromium(config.chromium_path.as_deref()).with_context(|| {
            format!("Chromium not found. Install Chrome or set {CHROMIUM_PATH_ENV}.")
        })?;

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(config.viewport.width, config.viewport.height)
            .viewport(Viewport {
                width: config.viewport.width,
                height: config.viewport.height,
                ..Viewport::default()
            })
            .request_timeout(cdp_request_timeout(&config.wait))
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("failed to launch Chromium")?;

        // Drive the CDP connection; page state is only touched by the context owner.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler error: {e}");
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            user_agent: config.user_agent.clone(),
            active_count: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        page.set_user_agent(self.user_agent.as_str())
            .await
            .context("failed to set user agent")?;

        self.active_count.fetch_add(1, Ordering::Relaxed);

        Ok(Box::new(ChromiumContext {
            page,
            active_count: Arc::clone(&self.active_count),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        // The browser process is killed when ChromiumRenderer is dropped.
        self.handler.abort();
        Ok(())
    }

    fn active_contexts(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
    active_count: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(
        &mut self,
        url: &str,
        wait: &WaitPolicy,
    ) -> Result<NavigationResult, NavigationError> {
        let failed = |reason: String| NavigationError::Failed {
            url: url.to_string(),
            reason,
        };
        let start = Instant::now();

        // Subscribe before `goto` so requests issued during load are counted.
        let mut started = self
            .page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let mut finished = self
            .page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| failed(e.to_string()))?;
        let mut errored = self
            .page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let page = &self.page;
        let load = async {
            page.goto(url).await.map_err(|e| goto_error(url, wait, e))?;

            let mut tracker =
                InflightTracker::new(wait.max_inflight, wait.idle_window, Instant::now());
            let mut tick = tokio::time::interval(IDLE_POLL);
            loop {
                tokio::select! {
                    Some(ev) = started.next() => {
                        tracker.request_started(ev.request_id.inner(), Instant::now());
                    }
                    Some(ev) = finished.next() => {
                        tracker.request_settled(ev.request_id.inner(), Instant::now());
                    }
                    Some(ev) = errored.next() => {
                        tracker.request_settled(ev.request_id.inner(), Instant::now());
                    }
                    _ = tick.tick() => {
                        if tracker.is_idle(Instant::now()) {
                            break;
                        }
                    }
                }
            }
            Ok::<_, NavigationError>(tracker.peak())
        };

        let peak_inflight = match tokio::time::timeout(wait.timeout, load).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(NavigationError::Timeout {
                    url: url.to_string(),
                    timeout_ms: wait.timeout_ms(),
                })
            }
        };
        let load_time_ms = start.elapsed().as_millis() as u64;

        tokio::time::sleep(wait.settle).await;

        let final_url = self
            .page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| url.to_string());

        Ok(NavigationResult {
            final_url,
            load_time_ms,
            peak_inflight,
        })
    }

    async fn execute_js(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS execution failed")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }

    async fn screenshot_page(&self) -> Result<Vec<u8>, ScreenshotError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|e| ScreenshotError::Capture(e.to_string()))
    }

    async fn screenshot_elements(&self, selector: &str, limit: usize) -> Result<Vec<ElementShot>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("querying {selector}"))?;

        let mut shots = Vec::with_capacity(elements.len().min(limit));
        for (index, element) in elements.iter().take(limit).enumerate() {
            let png = match element.bounding_box().await {
                Ok(b) if b.width > 0.0 && b.height > 0.0 => element
                    .screenshot(CaptureScreenshotFormat::Png)
                    .await
                    .map_err(|e| ScreenshotError::Capture(e.to_string())),
                Ok(_) => Err(ScreenshotError::EmptyBox),
                Err(e) => Err(ScreenshotError::Capture(e.to_string())),
            };
            shots.push(ElementShot { index, png });
        }
        Ok(shots)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.active_count.fetch_sub(1, Ordering::Relaxed);
        let _ = self.page.close().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::collect_snapshot;

    #[test]
    fn cdp_requests_outlive_the_navigation_timeout() {
        let wait = WaitPolicy::default();
        assert!(cdp_request_timeout(&wait) > wait.timeout);

        let short = WaitPolicy {
            timeout: Duration::from_secs(3),
            ..WaitPolicy::default()
        };
        assert_eq!(cdp_request_timeout(&short), Duration::from_secs(8));
    }

    #[test]
    fn cdp_timeout_during_goto_is_a_retryable_timeout() {
        let wait = WaitPolicy::default();
        let err = goto_error("https://luma.test/style-guide", &wait, CdpError::Timeout);
        assert!(matches!(
            &err,
            NavigationError::Timeout { url, timeout_ms }
                if url == "https://luma.test/style-guide" && *timeout_ms == 60_000
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn other_goto_failures_are_not_retryable() {
        let wait = WaitPolicy::default();
        let err = goto_error("https://luma.test/style-guide", &wait, CdpError::NotFound);
        assert!(matches!(err, NavigationError::Failed { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_snapshot_and_capture() {
        let config = HarvestConfig::default().with_env();
        let renderer = ChromiumRenderer::launch(&config)
            .await
            .expect("failed to launch renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        let wait = WaitPolicy {
            timeout: Duration::from_secs(10),
            settle: Duration::from_millis(50),
            ..WaitPolicy::default()
        };
        let url = "data:text/html,<style>.btn{box-shadow:0 1px 2px red}</style><button class='Btn-Primary btn'>Go</button>";
        let nav = ctx.navigate(url, &wait).await.expect("navigation failed");
        assert!(nav.load_time_ms < 10_000);

        let snapshot = collect_snapshot(ctx.as_ref(), url)
            .await
            .expect("snapshot failed");
        assert!(snapshot.elements.iter().any(|e| e.tag == "BUTTON"));

        let png = ctx.screenshot_page().await.expect("screenshot failed");
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let shots = ctx
            .screenshot_elements("button", 20)
            .await
            .expect("element query failed");
        assert_eq!(shots.len(), 1);

        ctx.close().await.expect("close failed");
        assert_eq!(renderer.active_contexts(), 0);

        renderer.shutdown().await.expect("shutdown failed");
    }
}
