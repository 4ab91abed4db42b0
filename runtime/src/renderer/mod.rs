//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderContext` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide).

pub mod chromium;
pub mod idle;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WaitPolicy;
use crate::error::{NavigationError, ScreenshotError};

/// Result of navigating to a URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time from request until the network went idle, in milliseconds.
    pub load_time_ms: u64,
    /// Highest number of concurrent requests seen while loading.
    pub peak_inflight: usize,
}

/// Outcome of capturing one element matched by a selector.
#[derive(Debug)]
pub struct ElementShot {
    /// Position among the selector's matches.
    pub index: usize,
    pub png: Result<Vec<u8>, ScreenshotError>,
}

/// A browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
    /// Number of currently active contexts.
    fn active_contexts(&self) -> usize;
}

/// A single browser context (tab) for rendering pages.
///
/// `navigate` takes `&mut self`: one navigation at a time per context.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Load `url` and wait for network idle plus the settle delay.
    async fn navigate(
        &mut self,
        url: &str,
        wait: &WaitPolicy,
    ) -> Result<NavigationResult, NavigationError>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// PNG of the whole scrollable page.
    async fn screenshot_page(&self) -> Result<Vec<u8>, ScreenshotError>;
    /// PNGs of the first `limit` elements matching `selector`, each failing on its own.
    async fn screenshot_elements(&self, selector: &str, limit: usize) -> Result<Vec<ElementShot>>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}
