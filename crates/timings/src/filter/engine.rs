use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

/// A single compiled matcher deciding whether a request path is kept.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    matcher: RegexMatcher,
    mode: FilterMode,
}

impl FilterEngine {
    pub fn new(pattern: &str, case_sensitive: bool, mode: FilterMode) -> Result<Self, FilterError> {
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!case_sensitive)
            .multi_line(false)
            .build(pattern)
            .map_err(|e| FilterError::InvalidRegex(e.to_string()))?;

        Ok(Self { matcher, mode })
    }

    #[inline]
    pub fn should_include(&self, path: &str) -> bool {
        let matches = self.matcher.is_match(path.as_bytes()).unwrap_or(false);

        match self.mode {
            FilterMode::Include => matches,
            FilterMode::Exclude => !matches,
        }
    }
}
