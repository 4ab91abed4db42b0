//! Single-pass design-token extraction over a [`PageSnapshot`].

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::matcher::MatcherSet;
use crate::snapshot::{leading_number, ElementSample, PageSnapshot, StyleProperty};
use crate::types::{
    BorderDescriptor, ColorUsage, ComponentGuess, ExtractionRecord, FontFace, KeyframesDescriptor,
    MotionDescriptor, RawStyleRule, ShadowDescriptor, SpacingDescriptor, TransitionDescriptor,
    TypographyDescriptor,
};

/// Maximum characters of outer HTML kept for a component guess.
pub const MAX_COMPONENT_HTML: usize = 1000;

/// Prefix of CSS custom property names.
pub const CUSTOM_PROPERTY_PREFIX: &str = "--";

/// Computed default for `transition` in Chromium.
pub const DEFAULT_TRANSITION: &str = "all 0s ease 0s";

const TRANSPARENT: &[&str] = &["transparent", "rgba(0, 0, 0, 0)"];

/// Turns page snapshots into extraction records.
#[derive(Debug, Default)]
pub struct Extractor {
    matchers: MatcherSet,
}

impl Extractor {
    pub fn new(matchers: MatcherSet) -> Self {
        Self { matchers }
    }

    pub fn matchers(&self) -> &MatcherSet {
        &self.matchers
    }

    /// Build the record for one page. Dedup state lives only for this call.
    pub fn extract(&self, snapshot: &PageSnapshot) -> ExtractionRecord {
        let mut pass = PagePass::new(snapshot);

        for element in snapshot.elements.iter().filter(|e| e.rect.is_visible()) {
            pass.colors(element);
            pass.typography(element);
            pass.spacing(element);
            pass.decorations(element);
            if self.matchers.matches(element) {
                pass.component(element);
            }
        }
        pass.css_variables(snapshot);
        pass.stylesheets(snapshot);

        debug!(
            url = %snapshot.url,
            elements = snapshot.elements.len(),
            colors = pass.record.colors.len(),
            components = pass.record.components.len(),
            "extracted page"
        );
        pass.record
    }
}

/// Per-page accumulation. Dropped once the record is finished.
struct PagePass {
    record: ExtractionRecord,
    seen_colors: HashSet<(StyleProperty, String)>,
    seen_fonts: HashSet<FontFace>,
    seen_spacing: HashSet<(StyleProperty, String)>,
}

impl PagePass {
    fn new(snapshot: &PageSnapshot) -> Self {
        Self {
            record: ExtractionRecord {
                url: snapshot.url.clone(),
                title: snapshot.title.clone(),
                ..ExtractionRecord::default()
            },
            seen_colors: HashSet::new(),
            seen_fonts: HashSet::new(),
            seen_spacing: HashSet::new(),
        }
    }

    fn colors(&mut self, el: &ElementSample) {
        for &property in StyleProperty::COLORS {
            let value = el.styles.value(property);
            if value.is_empty() || TRANSPARENT.contains(&value) {
                continue;
            }
            if !self.seen_colors.insert((property, value.to_string())) {
                continue;
            }
            self.record
                .colors
                .entry(value.to_string())
                .or_default()
                .push(ColorUsage {
                    property,
                    element: el.tag.clone(),
                    classes: el.classes.clone(),
                });
        }
    }

    fn typography(&mut self, el: &ElementSample) {
        let s = &el.styles;
        if !leading_number(s.value(StyleProperty::FontSize)).is_some_and(|size| size > 0.0) {
            return;
        }
        let font = FontFace {
            font_family: s.value(StyleProperty::FontFamily).to_string(),
            font_size: s.value(StyleProperty::FontSize).to_string(),
            font_weight: s.value(StyleProperty::FontWeight).to_string(),
            line_height: s.value(StyleProperty::LineHeight).to_string(),
            letter_spacing: s.value(StyleProperty::LetterSpacing).to_string(),
            text_transform: s.value(StyleProperty::TextTransform).to_string(),
            text_decoration: s.value(StyleProperty::TextDecoration).to_string(),
        };
        if self.seen_fonts.insert(font.clone()) {
            self.record.typography.push(TypographyDescriptor {
                element: el.tag.clone(),
                classes: el.classes.clone(),
                font,
            });
        }
    }

    fn spacing(&mut self, el: &ElementSample) {
        for &property in StyleProperty::SPACING {
            let value = el.styles.value(property);
            if value.is_empty() || value == "0px" || value == "auto" {
                continue;
            }
            if self.seen_spacing.insert((property, value.to_string())) {
                self.record.spacing.push(SpacingDescriptor {
                    property,
                    value: value.to_string(),
                    element: el.tag.clone(),
                    classes: el.classes.clone(),
                });
            }
        }
    }

    /// Shadows, radii, transitions and keyframes: recorded on every element, no dedup.
    fn decorations(&mut self, el: &ElementSample) {
        let s = &el.styles;

        let shadow = s.value(StyleProperty::BoxShadow);
        if !shadow.is_empty() && shadow != "none" {
            self.record.shadows.push(ShadowDescriptor {
                value: shadow.to_string(),
                element: el.tag.clone(),
                classes: el.classes.clone(),
            });
        }

        let radius = s.value(StyleProperty::BorderRadius);
        if !radius.is_empty() && radius != "0px" {
            self.record.borders.push(BorderDescriptor {
                border_radius: radius.to_string(),
                element: el.tag.clone(),
                classes: el.classes.clone(),
            });
        }

        let transition = s.value(StyleProperty::Transition);
        if !transition.is_empty() && transition != DEFAULT_TRANSITION {
            self.record
                .animations
                .push(MotionDescriptor::Transition(TransitionDescriptor {
                    transition: transition.to_string(),
                    element: el.tag.clone(),
                    classes: el.classes.clone(),
                }));
        }

        let animation = s.value(StyleProperty::AnimationName);
        if !animation.is_empty() && animation != "none" {
            self.record
                .animations
                .push(MotionDescriptor::Keyframes(KeyframesDescriptor {
                    animation_name: animation.to_string(),
                    animation_duration: s.value(StyleProperty::AnimationDuration).to_string(),
                    animation_timing_function: s
                        .value(StyleProperty::AnimationTimingFunction)
                        .to_string(),
                    element: el.tag.clone(),
                    classes: el.classes.clone(),
                }));
        }
    }

    fn component(&mut self, el: &ElementSample) {
        self.record.components.push(ComponentGuess {
            tag: el.tag.clone(),
            classes: el.classes.clone(),
            id: el.id.clone().filter(|id| !id.is_empty()),
            html: truncate_chars(&el.html, MAX_COMPONENT_HTML),
            styles: el.styles.subset(StyleProperty::COMPONENT_SNAPSHOT),
            dimensions: el.rect,
            attributes: el.attributes.clone(),
        });
    }

    fn css_variables(&mut self, snapshot: &PageSnapshot) {
        for (name, value) in &snapshot.root_properties {
            let value = value.trim();
            if name.starts_with(CUSTOM_PROPERTY_PREFIX) && !value.is_empty() {
                self.record
                    .css_variables
                    .insert(name.clone(), value.to_string());
            }
        }
    }

    fn stylesheets(&mut self, snapshot: &PageSnapshot) {
        for sheet in &snapshot.stylesheets {
            if let Some(err) = &sheet.error {
                warn!(
                    url = %snapshot.url,
                    sheet = sheet.index,
                    href = sheet.href.as_deref().unwrap_or("inline"),
                    "stylesheet not readable: {err}"
                );
                continue;
            }
            for rule in &sheet.rules {
                self.record.raw_styles.push(RawStyleRule {
                    sheet: sheet.index,
                    rule: rule.index,
                    selector: rule
                        .selector
                        .clone()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| "unknown".to_string()),
                    css_text: rule.css_text.clone(),
                });
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{ComputedStyle, Rect, RuleSample, StylesheetSample};

    fn visible() -> Rect {
        Rect {
            width: 100.0,
            height: 20.0,
            top: 0.0,
            left: 0.0,
        }
    }

    fn el(index: usize, tag: &str, classes: &[&str], styles: ComputedStyle) -> ElementSample {
        ElementSample {
            index,
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            rect: visible(),
            html: format!("<{tag}></{tag}>"),
            styles,
            ..ElementSample::default()
        }
    }

    fn font(size: &str) -> ComputedStyle {
        ComputedStyle::new()
            .with(StyleProperty::FontFamily, "Inter, sans-serif")
            .with(StyleProperty::FontSize, size)
            .with(StyleProperty::FontWeight, "400")
            .with(StyleProperty::LineHeight, "24px")
            .with(StyleProperty::LetterSpacing, "normal")
            .with(StyleProperty::TextTransform, "none")
            .with(StyleProperty::TextDecoration, "none solid rgb(0, 0, 0)")
    }

    fn page(elements: Vec<ElementSample>) -> PageSnapshot {
        PageSnapshot {
            url: "https://example.com/style-guide".into(),
            title: "Style Guide".into(),
            elements,
            ..PageSnapshot::default()
        }
    }

    #[test]
    fn shadow_value_is_kept_verbatim() {
        let shadow = "rgba(0, 0, 0, 0.1) 0px 1px 3px 0px, rgba(0, 0, 0, 0.06) 0px 1px 2px 0px";
        let snap = page(vec![
            el(0, "DIV", &["card"], ComputedStyle::new().with(StyleProperty::BoxShadow, shadow)),
            el(1, "DIV", &[], ComputedStyle::new().with(StyleProperty::BoxShadow, "none")),
        ]);
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.shadows.len(), 1);
        assert_eq!(record.shadows[0].value, shadow);
        assert_eq!(record.shadows[0].classes, vec!["card".to_string()]);
    }

    #[test]
    fn identical_fonts_yield_one_typography_entry() {
        let snap = page(vec![
            el(0, "P", &["body"], font("16px")),
            el(1, "SPAN", &["label"], font("16px")),
            el(2, "H1", &[], font("32px")),
        ]);
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.typography.len(), 2);
        assert_eq!(record.typography[0].element, "P");
        assert_eq!(record.typography[0].font.font_size, "16px");
        assert_eq!(record.typography[1].font.font_size, "32px");
    }

    #[test]
    fn zero_font_size_is_not_typography() {
        let snap = page(vec![
            el(0, "DIV", &[], font("0px")),
            el(1, "DIV", &[], ComputedStyle::new()),
        ]);
        let record = Extractor::default().extract(&snap);
        assert!(record.typography.is_empty());
    }

    #[test]
    fn colors_dedup_by_property_and_value_within_page() {
        let black = "rgb(0, 0, 0)";
        let snap = page(vec![
            el(0, "P", &[], ComputedStyle::new().with(StyleProperty::Color, black)),
            el(1, "P", &[], ComputedStyle::new().with(StyleProperty::Color, black)),
            el(
                2,
                "DIV",
                &[],
                ComputedStyle::new()
                    .with(StyleProperty::BackgroundColor, black)
                    .with(StyleProperty::BorderColor, "transparent")
                    .with(StyleProperty::Fill, "rgba(0, 0, 0, 0)"),
            ),
        ]);
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.colors.len(), 1);
        let usages = &record.colors[black];
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[0].property, StyleProperty::Color);
        assert_eq!(usages[1].property, StyleProperty::BackgroundColor);
    }

    #[test]
    fn dedup_state_resets_between_pages() {
        let extractor = Extractor::default();
        let snap = page(vec![el(
            0,
            "P",
            &[],
            font("14px").with(StyleProperty::Color, "rgb(1, 2, 3)"),
        )]);
        let first = extractor.extract(&snap);
        let second = extractor.extract(&snap);
        assert_eq!(first.colors.len(), 1);
        assert_eq!(second.colors.len(), 1);
        assert_eq!(second.typography.len(), 1);
    }

    #[test]
    fn spacing_skips_defaults_and_dedups() {
        let styles = ComputedStyle::new()
            .with(StyleProperty::MarginTop, "0px")
            .with(StyleProperty::MarginLeft, "auto")
            .with(StyleProperty::PaddingTop, "8px")
            .with(StyleProperty::PaddingBottom, "8px")
            .with(StyleProperty::Gap, "normal");
        let snap = page(vec![el(0, "DIV", &[], styles.clone()), el(1, "DIV", &[], styles)]);
        let record = Extractor::default().extract(&snap);
        let pairs: Vec<_> = record
            .spacing
            .iter()
            .map(|s| (s.property, s.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (StyleProperty::PaddingTop, "8px"),
                (StyleProperty::PaddingBottom, "8px"),
                (StyleProperty::Gap, "normal"),
            ]
        );
    }

    #[test]
    fn invisible_elements_are_skipped() {
        let mut hidden = el(
            0,
            "BUTTON",
            &["btn"],
            ComputedStyle::new().with(StyleProperty::Color, "rgb(9, 9, 9)"),
        );
        hidden.rect.height = 0.0;
        let record = Extractor::default().extract(&page(vec![hidden]));
        assert!(record.colors.is_empty());
        assert!(record.components.is_empty());
    }

    #[test]
    fn transitions_and_keyframes_are_recorded() {
        let snap = page(vec![
            el(
                0,
                "DIV",
                &[],
                ComputedStyle::new().with(StyleProperty::Transition, DEFAULT_TRANSITION),
            ),
            el(
                1,
                "DIV",
                &[],
                ComputedStyle::new()
                    .with(StyleProperty::Transition, "opacity 0.3s ease 0s")
                    .with(StyleProperty::AnimationName, "spin")
                    .with(StyleProperty::AnimationDuration, "1s")
                    .with(StyleProperty::AnimationTimingFunction, "linear"),
            ),
        ]);
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.animations.len(), 2);
        assert!(matches!(
            &record.animations[0],
            MotionDescriptor::Transition(t) if t.transition == "opacity 0.3s ease 0s"
        ));
        assert!(matches!(
            &record.animations[1],
            MotionDescriptor::Keyframes(k)
                if k.animation_name == "spin" && k.animation_duration == "1s"
        ));
    }

    #[test]
    fn border_radius_skips_zero() {
        let snap = page(vec![
            el(0, "DIV", &[], ComputedStyle::new().with(StyleProperty::BorderRadius, "0px")),
            el(1, "DIV", &[], ComputedStyle::new().with(StyleProperty::BorderRadius, "8px")),
            el(2, "DIV", &[], ComputedStyle::new().with(StyleProperty::BorderRadius, "8px")),
        ]);
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.borders.len(), 2);
    }

    #[test]
    fn nested_components_are_all_recorded() {
        let mut outer = el(0, "DIV", &["Card-Container"], font("14px"));
        outer.attributes.insert("class".into(), "Card-Container".into());
        outer.id = Some(String::new());
        let inner = el(1, "BUTTON", &[], font("14px"));
        let record = Extractor::default().extract(&page(vec![outer, inner]));
        assert_eq!(record.components.len(), 2);
        assert_eq!(record.components[0].tag, "DIV");
        assert_eq!(record.components[0].id, None);
        assert_eq!(record.components[0].attributes["class"], "Card-Container");
        assert_eq!(
            record.components[0].styles.get(&StyleProperty::FontSize).map(String::as_str),
            Some("14px")
        );
        assert!(!record.components[0].styles.contains_key(&StyleProperty::FontFamily));
        assert_eq!(record.components[1].tag, "BUTTON");
    }

    #[test]
    fn component_html_is_truncated() {
        let mut button = el(0, "BUTTON", &[], ComputedStyle::new());
        button.html = "é".repeat(MAX_COMPONENT_HTML + 50);
        let record = Extractor::default().extract(&page(vec![button]));
        assert_eq!(record.components[0].html.chars().count(), MAX_COMPONENT_HTML);
    }

    #[test]
    fn custom_matchers_extend_detection() {
        let matchers = MatcherSet::empty().with(|e: &ElementSample| e.tag == "NAV");
        let snap = page(vec![
            el(0, "NAV", &[], ComputedStyle::new()),
            el(1, "BUTTON", &[], ComputedStyle::new()),
        ]);
        let record = Extractor::new(matchers).extract(&snap);
        assert_eq!(record.components.len(), 1);
        assert_eq!(record.components[0].tag, "NAV");
    }

    #[test]
    fn css_variables_need_prefix_and_value() {
        let mut snap = page(vec![]);
        snap.root_properties.insert("--brand".into(), " #ff5a00 ".into());
        snap.root_properties.insert("--empty".into(), "   ".into());
        snap.root_properties.insert("color".into(), "red".into());
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.css_variables.len(), 1);
        assert_eq!(record.css_variables["--brand"], "#ff5a00");
    }

    #[test]
    fn unreadable_sheet_does_not_stop_later_sheets() {
        let mut snap = page(vec![]);
        snap.stylesheets = vec![
            StylesheetSample {
                index: 0,
                href: Some("https://cdn.other.net/a.css".into()),
                rules: vec![],
                error: Some("SecurityError: Failed to read the 'cssRules' property".into()),
            },
            StylesheetSample {
                index: 1,
                href: None,
                rules: vec![
                    RuleSample {
                        index: 0,
                        selector: Some(".btn".into()),
                        css_text: ".btn { color: red; }".into(),
                    },
                    RuleSample {
                        index: 1,
                        selector: None,
                        css_text: "@font-face { font-family: Inter; }".into(),
                    },
                ],
                error: None,
            },
        ];
        let record = Extractor::default().extract(&snap);
        assert_eq!(record.raw_styles.len(), 2);
        assert_eq!(record.raw_styles[0].sheet, 1);
        assert_eq!(record.raw_styles[0].selector, ".btn");
        assert_eq!(record.raw_styles[1].selector, "unknown");
    }

    #[test]
    fn extraction_is_deterministic() {
        let snap = page(vec![
            el(0, "BUTTON", &["btn"], font("14px").with(StyleProperty::Color, "rgb(1, 1, 1)")),
            el(1, "DIV", &["card"], font("12px").with(StyleProperty::BoxShadow, "0 0 1px red")),
        ]);
        let extractor = Extractor::default();
        let a = serde_json::to_value(extractor.extract(&snap)).unwrap();
        let b = serde_json::to_value(extractor.extract(&snap)).unwrap();
        assert_json_diff::assert_json_eq!(a, b);
    }

    #[test]
    fn truncate_chars_keeps_short_strings() {
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc");
    }
}
