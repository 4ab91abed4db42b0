//! Output directory layout and JSON persistence.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{AggregateResult, HarvestResult, Summary};

/// File name of the pretty-printed aggregate.
pub const EXTRACTION_FILE: &str = "luma-complete-extraction.json";

/// File name of the run summary.
pub const SUMMARY_FILE: &str = "summary.json";

/// Directory holding per-page screenshot folders.
pub const SCREENSHOT_DIR: &str = "screenshots";

/// File name of the full-page capture inside a page folder.
pub const FULL_PAGE_FILE: &str = "full-page.png";

/// Paths of every artifact a run produces, rooted at one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extraction_path(&self) -> PathBuf {
        self.root.join(EXTRACTION_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    pub fn screenshots_root(&self) -> PathBuf {
        self.root.join(SCREENSHOT_DIR)
    }

    pub fn screenshot_dir(&self, page: &str) -> PathBuf {
        self.screenshots_root().join(page)
    }

    pub fn full_page_path(&self, page: &str) -> PathBuf {
        self.screenshot_dir(page).join(FULL_PAGE_FILE)
    }

    pub fn component_path(&self, page: &str, index: usize) -> PathBuf {
        self.screenshot_dir(page)
            .join(format!("component-{index}.png"))
    }

    /// Write the aggregate and return the file path.
    pub fn write_aggregate(&self, aggregate: &AggregateResult) -> HarvestResult<PathBuf> {
        let path = self.extraction_path();
        write_pretty_json(&path, aggregate)?;
        Ok(path)
    }

    /// Write the summary and return the file path.
    pub fn write_summary(&self, summary: &Summary) -> HarvestResult<PathBuf> {
        let path = self.summary_path();
        write_pretty_json(&path, summary)?;
        Ok(path)
    }

    /// Read back a previously written aggregate.
    pub fn read_aggregate(&self) -> HarvestResult<AggregateResult> {
        let bytes = std::fs::read(self.extraction_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn read_summary(&self) -> HarvestResult<Summary> {
        let bytes = std::fs::read(self.summary_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Serialize `value` with two-space indentation, creating parent directories.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> HarvestResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, payload)?;
    tracing::debug!("wrote {}", path.display());
    Ok(())
}
