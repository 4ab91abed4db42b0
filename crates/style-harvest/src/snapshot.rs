//! Typed DOM snapshot produced by the in-page collection script.
//!
//! The browser side only reads values; every decision about what is worth
//! keeping is made in Rust over a `PageSnapshot`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every computed-style property the pipeline reads.
///
/// Serialized names are the camelCase `CSSStyleDeclaration` keys, which is
/// also how the in-page script looks them up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleProperty {
    Color,
    BackgroundColor,
    BorderColor,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    Fill,
    Stroke,
    FontFamily,
    FontSize,
    FontWeight,
    LineHeight,
    LetterSpacing,
    TextTransform,
    TextDecoration,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    Gap,
    RowGap,
    ColumnGap,
    BoxShadow,
    BorderRadius,
    Transition,
    AnimationName,
    AnimationDuration,
    AnimationTimingFunction,
    Display,
    Position,
    Width,
    Height,
    Padding,
    Margin,
    Border,
    Transform,
    Cursor,
}

impl StyleProperty {
    /// All properties, in declaration order.
    pub const ALL: &'static [StyleProperty] = &[
        Self::Color,
        Self::BackgroundColor,
        Self::BorderColor,
        Self::BorderTopColor,
        Self::BorderRightColor,
        Self::BorderBottomColor,
        Self::BorderLeftColor,
        Self::Fill,
        Self::Stroke,
        Self::FontFamily,
        Self::FontSize,
        Self::FontWeight,
        Self::LineHeight,
        Self::LetterSpacing,
        Self::TextTransform,
        Self::TextDecoration,
        Self::MarginTop,
        Self::MarginRight,
        Self::MarginBottom,
        Self::MarginLeft,
        Self::PaddingTop,
        Self::PaddingRight,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::Gap,
        Self::RowGap,
        Self::ColumnGap,
        Self::BoxShadow,
        Self::BorderRadius,
        Self::Transition,
        Self::AnimationName,
        Self::AnimationDuration,
        Self::AnimationTimingFunction,
        Self::Display,
        Self::Position,
        Self::Width,
        Self::Height,
        Self::Padding,
        Self::Margin,
        Self::Border,
        Self::Transform,
        Self::Cursor,
    ];

    /// Properties whose values are collected into the color palette.
    pub const COLORS: &'static [StyleProperty] = &[
        Self::Color,
        Self::BackgroundColor,
        Self::BorderColor,
        Self::BorderTopColor,
        Self::BorderRightColor,
        Self::BorderBottomColor,
        Self::BorderLeftColor,
        Self::Fill,
        Self::Stroke,
    ];

    /// Box-model properties collected as spacing tokens.
    pub const SPACING: &'static [StyleProperty] = &[
        Self::MarginTop,
        Self::MarginRight,
        Self::MarginBottom,
        Self::MarginLeft,
        Self::PaddingTop,
        Self::PaddingRight,
        Self::PaddingBottom,
        Self::PaddingLeft,
        Self::Gap,
        Self::RowGap,
        Self::ColumnGap,
    ];

    /// Style snapshot stored with every component guess.
    pub const COMPONENT_SNAPSHOT: &'static [StyleProperty] = &[
        Self::Display,
        Self::Position,
        Self::Width,
        Self::Height,
        Self::Padding,
        Self::Margin,
        Self::Border,
        Self::BorderRadius,
        Self::BackgroundColor,
        Self::Color,
        Self::FontSize,
        Self::FontWeight,
        Self::BoxShadow,
        Self::Transition,
        Self::Transform,
        Self::Cursor,
    ];

    /// The `CSSStyleDeclaration` key for this property.
    pub fn js_name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::BackgroundColor => "backgroundColor",
            Self::BorderColor => "borderColor",
            Self::BorderTopColor => "borderTopColor",
            Self::BorderRightColor => "borderRightColor",
            Self::BorderBottomColor => "borderBottomColor",
            Self::BorderLeftColor => "borderLeftColor",
            Self::Fill => "fill",
            Self::Stroke => "stroke",
            Self::FontFamily => "fontFamily",
            Self::FontSize => "fontSize",
            Self::FontWeight => "fontWeight",
            Self::LineHeight => "lineHeight",
            Self::LetterSpacing => "letterSpacing",
            Self::TextTransform => "textTransform",
            Self::TextDecoration => "textDecoration",
            Self::MarginTop => "marginTop",
            Self::MarginRight => "marginRight",
            Self::MarginBottom => "marginBottom",
            Self::MarginLeft => "marginLeft",
            Self::PaddingTop => "paddingTop",
            Self::PaddingRight => "paddingRight",
            Self::PaddingBottom => "paddingBottom",
            Self::PaddingLeft => "paddingLeft",
            Self::Gap => "gap",
            Self::RowGap => "rowGap",
            Self::ColumnGap => "columnGap",
            Self::BoxShadow => "boxShadow",
            Self::BorderRadius => "borderRadius",
            Self::Transition => "transition",
            Self::AnimationName => "animationName",
            Self::AnimationDuration => "animationDuration",
            Self::AnimationTimingFunction => "animationTimingFunction",
            Self::Display => "display",
            Self::Position => "position",
            Self::Width => "width",
            Self::Height => "height",
            Self::Padding => "padding",
            Self::Margin => "margin",
            Self::Border => "border",
            Self::Transform => "transform",
            Self::Cursor => "cursor",
        }
    }
}

impl std::fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.js_name())
    }
}

/// Computed values read for one element. Properties whose read failed are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<StyleProperty, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw computed value, if it was read.
    pub fn get(&self, property: StyleProperty) -> Option<&str> {
        self.0.get(&property).map(String::as_str)
    }

    /// The computed value or an empty string when the read failed.
    pub fn value(&self, property: StyleProperty) -> &str {
        self.get(property).unwrap_or("")
    }

    pub fn set(&mut self, property: StyleProperty, value: impl Into<String>) {
        self.0.insert(property, value.into());
    }

    /// Builder-style `set`, handy for constructing fixtures.
    pub fn with(mut self, property: StyleProperty, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Copy out the subset of properties in `properties` that were read.
    pub fn subset(&self, properties: &[StyleProperty]) -> BTreeMap<StyleProperty, String> {
        properties
            .iter()
            .filter_map(|p| self.0.get(p).map(|v| (*p, v.clone())))
            .collect()
    }
}

/// Bounding client rect of an element, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

impl Rect {
    /// Elements with no rendered area are treated as invisible.
    pub fn is_visible(&self) -> bool {
        self.width != 0.0 && self.height != 0.0
    }
}

/// One DOM element as seen by the collection script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSample {
    /// Position in `document.querySelectorAll('*')`.
    pub index: usize,
    /// Tag name as reported by the DOM (upper case for HTML elements).
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub rect: Rect,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub styles: ComputedStyle,
}

impl ElementSample {
    /// Class list joined with single spaces and lower-cased.
    pub fn class_string_lower(&self) -> String {
        self.classes.join(" ").to_lowercase()
    }
}

/// A readable stylesheet rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSample {
    pub index: usize,
    #[serde(default)]
    pub selector: Option<String>,
    pub css_text: String,
}

/// One entry of `document.styleSheets`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylesheetSample {
    pub index: usize,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub rules: Vec<RuleSample>,
    /// Set when reading `cssRules` threw (typically a cross-origin sheet).
    #[serde(default)]
    pub error: Option<String>,
}

impl StylesheetSample {
    pub fn is_accessible(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the collection script returns for one loaded page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<ElementSample>,
    /// Custom properties computed on the document root.
    #[serde(default)]
    pub root_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub stylesheets: Vec<StylesheetSample>,
}

/// Parse the leading number of a CSS length, like `parseFloat` does.
///
/// `"16px"` gives `Some(16.0)`, `"-2.5em"` gives `Some(-2.5)`, `"normal"` gives `None`.
pub fn leading_number(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}
