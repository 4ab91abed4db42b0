//! Heuristic component detection.
//!
//! A `MatcherSet` is a list of predicates over an [`ElementSample`]; an element
//! is a component guess when any predicate accepts it. The keyword vocabulary
//! is the default predicate, and callers can add their own.

use crate::snapshot::ElementSample;

/// Keywords that mark an element as a likely design-system component.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "button", "btn", "input", "field", "card", "modal", "dialog", "dropdown", "select",
    "checkbox", "radio", "switch", "toggle", "slider", "tab", "accordion", "tooltip",
    "popover", "alert", "badge", "avatar", "chip", "pill",
];

/// Decides whether an element is a component guess.
pub trait ComponentMatcher: Send + Sync {
    fn matches(&self, element: &ElementSample) -> bool;
}

impl<F> ComponentMatcher for F
where
    F: Fn(&ElementSample) -> bool + Send + Sync,
{
    fn matches(&self, element: &ElementSample) -> bool {
        self(element)
    }
}

/// Matches class substrings, exact tag names and exact ARIA roles.
///
/// Class and tag comparison is case-insensitive; roles are compared as written.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl Default for KeywordMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

impl ComponentMatcher for KeywordMatcher {
    fn matches(&self, element: &ElementSample) -> bool {
        let classes = element.class_string_lower();
        let tag = element.tag.to_lowercase();
        self.keywords.iter().any(|k| {
            classes.contains(k.as_str())
                || tag == *k
                || element.role.as_deref() == Some(k.as_str())
        })
    }
}

/// Any-of combination of matchers.
pub struct MatcherSet {
    matchers: Vec<Box<dyn ComponentMatcher>>,
}

impl MatcherSet {
    /// A set with no predicates; matches nothing.
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    pub fn with(mut self, matcher: impl ComponentMatcher + 'static) -> Self {
        self.push(matcher);
        self
    }

    pub fn push(&mut self, matcher: impl ComponentMatcher + 'static) {
        self.matchers.push(Box::new(matcher));
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn matches(&self, element: &ElementSample) -> bool {
        self.matchers.iter().any(|m| m.matches(element))
    }
}

impl Default for MatcherSet {
    fn default() -> Self {
        Self::empty().with(KeywordMatcher::default())
    }
}

impl std::fmt::Debug for MatcherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherSet")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}
