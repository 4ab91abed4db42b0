//! Screenshot capture for one loaded page.

use std::path::Path;

use serde::Serialize;
use style_harvest::OutputLayout;
use tracing::{debug, warn};

use crate::error::ScreenshotError;
use crate::renderer::RenderContext;

/// What the screenshot step managed to save for a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub full_page: bool,
    /// Element screenshots written.
    pub saved: usize,
    /// Element screenshots skipped (empty box, capture or write failure).
    pub skipped: usize,
}

/// Save a full-page PNG and up to `limit` element PNGs under the page's folder.
///
/// Every failure is logged and counted; none is returned.
pub async fn capture_page(
    context: &dyn RenderContext,
    layout: &OutputLayout,
    page_key: &str,
    selector: &str,
    limit: usize,
) -> CaptureReport {
    let mut report = CaptureReport::default();

    let dir = layout.screenshot_dir(page_key);
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        warn!(page = page_key, "cannot create {}: {e}", dir.display());
        return report;
    }

    let full = match context.screenshot_page().await {
        Ok(png) => write_png(&layout.full_page_path(page_key), &png).await,
        Err(e) => Err(e),
    };
    match full {
        Ok(()) => report.full_page = true,
        Err(e) => warn!(page = page_key, "full-page screenshot failed: {e}"),
    }

    let shots = match context.screenshot_elements(selector, limit).await {
        Ok(shots) => shots,
        Err(e) => {
            warn!(page = page_key, "element query failed: {e:#}");
            return report;
        }
    };

    for shot in shots {
        let written = match shot.png {
            Ok(png) => write_png(&layout.component_path(page_key, shot.index), &png).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => report.saved += 1,
            Err(e) => {
                debug!(page = page_key, index = shot.index, "skipped element screenshot: {e}");
                report.skipped += 1;
            }
        }
    }

    report
}

async fn write_png(path: &Path, png: &[u8]) -> Result<(), ScreenshotError> {
    tokio::fs::write(path, png)
        .await
        .map_err(|source| ScreenshotError::Write {
            path: path.display().to_string(),
            source,
        })
}
