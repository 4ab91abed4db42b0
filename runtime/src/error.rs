//! Error taxonomy of the capture pipeline.
//!
//! Per-page errors (`NavigationError`, `ExtractionError`, `ScreenshotError`) are
//! logged by the orchestrator and never end a run. `FatalError` does.

use style_harvest::HarvestError;

/// Reaching a target page failed.
#[derive(thiserror::Error, Debug)]
pub enum NavigationError {
    #[error("navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Failed { url: String, reason: String },
}

impl NavigationError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. } | Self::Failed { url, .. } => url,
        }
    }

    /// Timeouts may succeed on a later attempt; the pipeline still skips the page.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// In-page evaluation threw, or its result could not be decoded.
#[derive(thiserror::Error, Debug)]
#[error("extraction failed for {url}: {cause}")]
pub struct ExtractionError {
    pub url: String,
    pub cause: String,
}

/// A single screenshot could not be produced or saved.
#[derive(thiserror::Error, Debug)]
pub enum ScreenshotError {
    #[error("element has an empty bounding box")]
    EmptyBox,

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that end the run with a non-zero exit status.
#[derive(thiserror::Error, Debug)]
pub enum FatalError {
    #[error("browser setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("failed to persist results: {0}")]
    Persist(#[from] HarvestError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retryable() {
        let err = NavigationError::Timeout {
            url: "https://luma.com/style-guide/button".into(),
            timeout_ms: 60_000,
        };
        assert!(err.is_retryable());
        assert_eq!(err.url(), "https://luma.com/style-guide/button");
        assert_eq!(
            err.to_string(),
            "navigation to https://luma.com/style-guide/button timed out after 60000ms"
        );

        let failed = NavigationError::Failed {
            url: "https://x.test".into(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        };
        assert!(!failed.is_retryable());
    }

    #[test]
    fn persist_wraps_core_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let fatal: FatalError = HarvestError::from(io).into();
        assert!(fatal.to_string().starts_with("failed to persist results"));
    }
}
