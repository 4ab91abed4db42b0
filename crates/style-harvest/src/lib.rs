//! style-harvest — core library for design-token extraction.
//!
//! Turns typed DOM snapshots of a rendered page into extraction records
//! (colors, typography, spacing, decorations, component guesses, CSS
//! variables, stylesheet rules), aggregates them per run, and persists the
//! results. Nothing here talks to a browser.

pub mod extract;
pub mod matcher;
pub mod snapshot;
pub mod storage;
pub mod types;

pub use extract::{Extractor, MAX_COMPONENT_HTML};
pub use matcher::{ComponentMatcher, KeywordMatcher, MatcherSet, DEFAULT_KEYWORDS};
pub use snapshot::{ComputedStyle, ElementSample, PageSnapshot, Rect, StyleProperty};
pub use storage::OutputLayout;
pub use types::*;
