//! In-page snapshot collection.
//!
//! The snapshot script is embedded at compile time and parameterized with the
//! `StyleProperty` vocabulary, so the browser reads exactly the properties the
//! extractor knows about.

use std::sync::OnceLock;

use style_harvest::{PageSnapshot, StyleProperty, MAX_COMPONENT_HTML};
use tracing::debug;

use crate::error::ExtractionError;
use crate::renderer::RenderContext;

const SNAPSHOT_TEMPLATE: &str = include_str!("snapshot.js");

/// The collection script with the property list and HTML limit filled in.
pub fn snapshot_script() -> &'static str {
    static SCRIPT: OnceLock<String> = OnceLock::new();
    SCRIPT.get_or_init(|| {
        let names: Vec<&str> = StyleProperty::ALL.iter().map(|p| p.js_name()).collect();
        let names = serde_json::Value::from(names).to_string();
        SNAPSHOT_TEMPLATE
            .replace("__STYLE_PROPERTIES__", &names)
            .replace("__HTML_LIMIT__", &MAX_COMPONENT_HTML.to_string())
    })
}

/// Run the snapshot script on the loaded page.
pub async fn collect_snapshot(
    context: &dyn RenderContext,
    url: &str,
) -> Result<PageSnapshot, ExtractionError> {
    let failed = |cause: String| ExtractionError {
        url: url.to_string(),
        cause,
    };

    let value = context
        .execute_js(snapshot_script())
        .await
        .map_err(|e| failed(format!("{e:#}")))?;

    if value.is_null() {
        return Err(failed("snapshot script returned nothing".to_string()));
    }

    let snapshot: PageSnapshot =
        serde_json::from_value(value).map_err(|e| failed(format!("malformed snapshot: {e}")))?;

    debug!(
        url,
        elements = snapshot.elements.len(),
        stylesheets = snapshot.stylesheets.len(),
        "collected snapshot"
    );
    Ok(snapshot)
}
