//! Core data types for extracted design tokens and aggregated runs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::{Rect, StyleProperty};

/// Where a color value was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorUsage {
    pub property: StyleProperty,
    pub element: String,
    pub classes: Vec<String>,
}

/// The font fields that make two typography entries equal.
///
/// Tag and classes are not part of the key: the same font on a `P` and a
/// `SPAN` is one typography style, reported with the first element that
/// carried it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFace {
    pub font_family: String,
    pub font_size: String,
    pub font_weight: String,
    pub line_height: String,
    pub letter_spacing: String,
    pub text_transform: String,
    pub text_decoration: String,
}

/// A typography style with the first element that showed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypographyDescriptor {
    pub element: String,
    pub classes: Vec<String>,
    #[serde(flatten)]
    pub font: FontFace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingDescriptor {
    pub property: StyleProperty,
    pub value: String,
    pub element: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowDescriptor {
    pub value: String,
    pub element: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderDescriptor {
    pub border_radius: String,
    pub element: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDescriptor {
    pub transition: String,
    pub element: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframesDescriptor {
    pub animation_name: String,
    pub animation_duration: String,
    pub animation_timing_function: String,
    pub element: String,
    pub classes: Vec<String>,
}

/// A transition or keyframe animation found on an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MotionDescriptor {
    Keyframes(KeyframesDescriptor),
    Transition(TransitionDescriptor),
}

/// An element that looks like a reusable design-system component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGuess {
    #[serde(rename = "type")]
    pub tag: String,
    pub classes: Vec<String>,
    pub id: Option<String>,
    /// Outer HTML, cut to [`crate::extract::MAX_COMPONENT_HTML`] characters.
    pub html: String,
    pub styles: BTreeMap<StyleProperty, String>,
    pub dimensions: Rect,
    pub attributes: BTreeMap<String, String>,
}

/// A rule read from one of the page's stylesheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyleRule {
    pub sheet: usize,
    pub rule: usize,
    pub selector: String,
    pub css_text: String,
}

/// Everything extracted from one page visit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub url: String,
    pub title: String,
    pub colors: BTreeMap<String, Vec<ColorUsage>>,
    pub typography: Vec<TypographyDescriptor>,
    pub spacing: Vec<SpacingDescriptor>,
    pub components: Vec<ComponentGuess>,
    pub animations: Vec<MotionDescriptor>,
    pub shadows: Vec<ShadowDescriptor>,
    pub borders: Vec<BorderDescriptor>,
    pub css_variables: BTreeMap<String, String>,
    pub raw_styles: Vec<RawStyleRule>,
}

/// All records collected during one run, keyed by page.
///
/// Records are append-only: a key can be inserted once and is never replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub extracted_at: DateTime<Utc>,
    pub base_url: String,
    pages: BTreeMap<String, ExtractionRecord>,
}

impl AggregateResult {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timestamp(base_url, Utc::now())
    }

    pub fn with_timestamp(base_url: impl Into<String>, extracted_at: DateTime<Utc>) -> Self {
        Self {
            extracted_at,
            base_url: base_url.into(),
            pages: BTreeMap::new(),
        }
    }

    /// Append a finished record. Fails if the key already has one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        record: ExtractionRecord,
    ) -> HarvestResult<()> {
        let key = key.into();
        if self.pages.contains_key(&key) {
            return Err(HarvestError::DuplicatePage(key));
        }
        self.pages.insert(key, record);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ExtractionRecord> {
        self.pages.get(key)
    }

    pub fn pages(&self) -> &BTreeMap<String, ExtractionRecord> {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Run-level counts written next to the aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_pages: usize,
    pub total_colors: usize,
    pub total_components: usize,
    #[serde(rename = "totalCSSVariables")]
    pub total_css_variables: usize,
    /// Targets that produced no record.
    #[serde(default)]
    pub failed_pages: Vec<String>,
    #[serde(default)]
    pub skipped_screenshots: usize,
}

impl Summary {
    /// Count pages, unique colors, components and unique CSS variables.
    ///
    /// Colors and variables are unioned across pages, components are summed.
    pub fn from_aggregate(aggregate: &AggregateResult) -> Self {
        let records = aggregate.pages().values();
        let colors: BTreeSet<&str> = records
            .clone()
            .flat_map(|r| r.colors.keys().map(String::as_str))
            .collect();
        let variables: BTreeSet<&str> = records
            .clone()
            .flat_map(|r| r.css_variables.keys().map(String::as_str))
            .collect();

        Self {
            total_pages: aggregate.len(),
            total_colors: colors.len(),
            total_components: records.map(|r| r.components.len()).sum(),
            total_css_variables: variables.len(),
            failed_pages: Vec::new(),
            skipped_screenshots: 0,
        }
    }
}

/// Errors that can occur in the core library.
#[derive(thiserror::Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Page already recorded: {0}")]
    DuplicatePage(String),
}

/// Convenience result type.
pub type HarvestResult<T> = Result<T, HarvestError>;
