//! Paths: request-path patterns and multi-pattern composition.

use crate::filter::engine::{FilterEngine, FilterMode, FilterError};

/// Well-known request-path patterns.
pub struct Patterns;

impl Patterns {
    /// Static assets served straight from disk.
    pub const STATIC_ASSETS: &'static str = r"^/static/";
}

/// Build a [`FilterEngine`] that matches **any** of the given patterns.
///
/// The patterns are joined with `|` into a single alternation so one compiled
/// matcher is evaluated per path.
pub fn multi_pattern<S: AsRef<str>>(
    patterns: &[S],
    mode: FilterMode,
) -> Result<FilterEngine, FilterError> {
    if patterns.is_empty() {
        return Err(FilterError::InvalidRegex("at least one pattern required".into()));
    }
    let combined = if patterns.len() == 1 {
        patterns[0].as_ref().to_string()
    } else {
        patterns
            .iter()
            .map(|p| format!("(?:{})", p.as_ref()))
            .collect::<Vec<_>>()
            .join("|")
    };
    FilterEngine::new(&combined, true, mode)
}

/// Exclude-mode filter dropping every path that matches one of `patterns`.
///
/// An empty list keeps everything.
pub fn skip_paths<S: AsRef<str>>(patterns: &[S]) -> Result<Option<FilterEngine>, FilterError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    multi_pattern(patterns, FilterMode::Exclude).map(Some)
}
