//! Sanitize: collapse high-cardinality URL segments into a wildcard.
//!
//! A [`UrlSanitizer`] is an ordered list of `(pattern, replacement)` rules
//! applied left to right. Rules are compiled once when the sanitizer is built
//! and are immutable afterwards, so one instance can be shared by any number
//! of threads.
//!
//! Every replacement is built from [`WILDCARD`], which none of the patterns
//! can match, so sanitizing an already sanitized URL is a no-op.

use regex::{NoExpand, Regex};

/// Token substituted for every variable path segment.
pub const WILDCARD: &str = "*";

/// Request path rules, shared by the Couch and Nginx parsers.
const APPLICATION_RULES: &[(&str, &str)] = &[
    // Tenant slugs
    (r"/a/[0-9a-z-]+", "/a/*"),
    // Indexes and ids
    (r"/modules-[0-9]+", "/modules-*"),
    (r"/forms-[0-9]+", "/forms-*"),
    (r"/form_data/[a-z0-9-]+", "/form_data/*"),
    (r"/uuid:[a-z0-9-]+", "/uuid:*"),
    // Any other hex-ish id
    (r"[-0-9a-f]{10,}", "*"),
    // Query string
    (r"\?[^ ]*", ""),
];

/// Couch database URL rules.
const COUCH_DATABASE_RULES: &[(&str, &str)] = &[
    (r"[0-9a-f]{32}", "*"),
    // Dashed uuids
    (r"[-0-9a-f]{36}", "*"),
];

#[derive(Debug, Clone)]
pub struct UrlSanitizer {
    rules: Vec<(Regex, &'static str)>,
}

impl UrlSanitizer {
    /// Build a sanitizer from `(pattern, replacement)` pairs, in application order.
    pub fn new(rules: &[(&str, &'static str)]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(pattern, replacement)| Regex::new(pattern).map(|re| (re, *replacement)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Rules for application request paths (`/a/<domain>/...`).
    pub fn application() -> Result<Self, regex::Error> {
        Self::new(APPLICATION_RULES)
    }

    /// Rules for the database URL a Couch request was proxied to.
    pub fn couch_database() -> Result<Self, regex::Error> {
        Self::new(COUCH_DATABASE_RULES)
    }

    pub fn apply(&self, url: &str) -> String {
        self.rules
            .iter()
            .fold(url.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, NoExpand(replacement)).into_owned()
            })
    }
}
