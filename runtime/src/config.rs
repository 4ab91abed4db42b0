//! Run configuration.
//!
//! The defaults reproduce the fixed style-guide crawl; the binary lets a few
//! fields be overridden from the command line.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::FatalError;

/// Style-guide index page.
pub const DEFAULT_BASE_URL: &str = "https://luma.com/style-guide";

/// Where results and screenshots are written.
pub const DEFAULT_OUTPUT_DIR: &str = "./extracted-data";

/// Component pages visited after the index, in order.
pub const DEFAULT_COMPONENT_PAGES: &[&str] = &[
    "button", "input", "text", "color", "controls", "collapse", "overlay", "icons", "events",
    "timeline", "tint", "editor", "banner", "social", "datetime", "chat", "weather",
];

/// Key under which the base URL's record is stored.
pub const INDEX_PAGE_KEY: &str = "index";

/// Desktop user agent sent by the headless browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Selector for elements captured individually.
pub const DEFAULT_COMPONENT_SELECTOR: &str =
    r#"[class*="button"], [class*="input"], [class*="card"]"#;

/// Environment variable overriding the Chromium binary path.
pub const CHROMIUM_PATH_ENV: &str = "STYLE_HARVEST_CHROMIUM_PATH";

/// How long and how quietly a navigation must settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Upper bound for load plus network idle.
    pub timeout: Duration,
    /// The network counts as idle at or below this many in-flight requests.
    pub max_inflight: usize,
    /// How long the network must stay idle.
    pub idle_window: Duration,
    /// Extra wait after idle for client-side rendering.
    pub settle: Duration,
}

impl WaitPolicy {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(60_000),
            max_inflight: 2,
            idle_window: Duration::from_millis(500),
            settle: Duration::from_millis(2_000),
        }
    }
}

/// Browser window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub component_pages: Vec<String>,
    pub wait: WaitPolicy,
    /// Pause before every navigation after the first.
    pub politeness_delay: Duration,
    pub component_selector: String,
    pub max_component_shots: usize,
    pub viewport: Viewport,
    pub user_agent: String,
    pub chromium_path: Option<PathBuf>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            component_pages: DEFAULT_COMPONENT_PAGES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            wait: WaitPolicy::default(),
            politeness_delay: Duration::from_millis(1_000),
            component_selector: DEFAULT_COMPONENT_SELECTOR.to_string(),
            max_component_shots: 20,
            viewport: Viewport::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chromium_path: None,
        }
    }
}

impl HarvestConfig {
    /// Apply environment overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(p) = std::env::var(CHROMIUM_PATH_ENV) {
            if !p.trim().is_empty() {
                self.chromium_path = Some(PathBuf::from(p));
            }
        }
        self
    }

    /// The index page followed by every component page, in order.
    pub fn targets(&self) -> Result<Vec<PageTarget>, FatalError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| FatalError::Config(format!("base URL {:?}: {e}", self.base_url)))?;

        let mut targets = Vec::with_capacity(self.component_pages.len() + 1);
        targets.push(PageTarget::new(INDEX_PAGE_KEY, base.as_str()));

        for slug in &self.component_pages {
            let slug = slug.trim_matches('/');
            if slug.is_empty() || slug == INDEX_PAGE_KEY {
                return Err(FatalError::Config(format!(
                    "component page slug {slug:?} is reserved or empty"
                )));
            }
            if targets.iter().any(|t| t.key == slug) {
                return Err(FatalError::Config(format!("duplicate component page {slug:?}")));
            }
            targets.push(PageTarget::new(slug, page_url(&base, slug)?.as_str()));
        }
        Ok(targets)
    }
}

/// `<base>/<slug>`, keeping the base path even without a trailing slash.
fn page_url(base: &Url, slug: &str) -> Result<Url, FatalError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| FatalError::Config(format!("base URL {base} cannot have a path")))?
        .pop_if_empty()
        .extend(slug.split('/'));
    Ok(url)
}

/// One page to visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    /// Key in the aggregate and name of the screenshot folder.
    pub key: String,
    pub url: String,
}

impl PageTarget {
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_start_with_index() {
        let targets = HarvestConfig::default().targets().unwrap();
        assert_eq!(targets.len(), DEFAULT_COMPONENT_PAGES.len() + 1);
        assert_eq!(targets[0], PageTarget::new("index", "https://luma.com/style-guide"));
        assert_eq!(
            targets[1],
            PageTarget::new("button", "https://luma.com/style-guide/button")
        );
        assert_eq!(targets.last().unwrap().key, "weather");
    }

    #[test]
    fn trailing_slash_in_base_is_tolerated() {
        let config = HarvestConfig {
            base_url: "https://example.com/guide/".into(),
            component_pages: vec!["card".into()],
            ..HarvestConfig::default()
        };
        let targets = config.targets().unwrap();
        assert_eq!(targets[1].url, "https://example.com/guide/card");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = HarvestConfig {
            base_url: "not a url".into(),
            ..HarvestConfig::default()
        };
        assert!(matches!(config.targets(), Err(FatalError::Config(_))));
    }

    #[test]
    fn duplicate_and_reserved_slugs_are_rejected() {
        let dup = HarvestConfig {
            component_pages: vec!["button".into(), "button".into()],
            ..HarvestConfig::default()
        };
        assert!(dup.targets().is_err());

        let reserved = HarvestConfig {
            component_pages: vec!["index".into()],
            ..HarvestConfig::default()
        };
        assert!(reserved.targets().is_err());
    }

    #[test]
    fn default_wait_policy() {
        let wait = WaitPolicy::default();
        assert_eq!(wait.timeout_ms(), 60_000);
        assert_eq!(wait.max_inflight, 2);
        assert_eq!(wait.settle, Duration::from_secs(2));
    }
}
