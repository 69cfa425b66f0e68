//! Model: TimingsConfig and related structs.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::filter::paths::{self, Patterns};
use crate::parser::formats::nginx::DEFAULT_APDEX_SATISFIED_SECS;
use crate::parser::{TimeBasis, MAX_LINE_SIZE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub parser: ParserKind,
    pub time_basis: TimeBasis,
    pub max_line_size: usize,
    pub apdex: ApdexConfig,
    pub nginx: NginxConfig,
}

/// Which log family is read and which metric is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    Couch,
    NginxTimings,
    NginxApdex,
    NginxRequests,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApdexConfig {
    /// Requests at or under this many seconds are satisfied; tolerated up to 4x
    pub satisfied_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxConfig {
    /// Request paths matching any of these regexes produce no metric
    pub skip_patterns: Vec<String>,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            parser: ParserKind::Couch,
            time_basis: TimeBasis::Local,
            max_line_size: MAX_LINE_SIZE,
            apdex: ApdexConfig::default(),
            nginx: NginxConfig::default(),
        }
    }
}

impl Default for ApdexConfig {
    fn default() -> Self {
        Self {
            satisfied_secs: DEFAULT_APDEX_SATISFIED_SECS,
        }
    }
}

impl Default for NginxConfig {
    fn default() -> Self {
        Self {
            skip_patterns: vec![Patterns::STATIC_ASSETS.to_string()],
        }
    }
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::Couch => "couch",
            ParserKind::NginxTimings => "nginx_timings",
            ParserKind::NginxApdex => "nginx_apdex",
            ParserKind::NginxRequests => "nginx_requests",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "couch" => Ok(ParserKind::Couch),
            "nginx_timings" => Ok(ParserKind::NginxTimings),
            "nginx_apdex" => Ok(ParserKind::NginxApdex),
            "nginx_requests" => Ok(ParserKind::NginxRequests),
            _ => Err(format!(
                "parser must be one of couch, nginx_timings, nginx_apdex, nginx_requests, got {:?}",
                s
            )),
        }
    }
}

impl TimingsConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.max_line_size == 0 {
            return Err("max_line_size must be > 0".to_string());
        }
        self.apdex.validate()?;
        self.nginx.validate()?;
        Ok(())
    }
}

impl ApdexConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.satisfied_secs.is_finite() || self.satisfied_secs <= 0.0 {
            return Err(format!(
                "apdex.satisfied_secs must be a positive number, got {}",
                self.satisfied_secs
            ));
        }
        Ok(())
    }
}

impl NginxConfig {
    pub fn validate(&self) -> Result<(), String> {
        paths::skip_paths(self.skip_patterns.as_slice())
            .map(|_| ())
            .map_err(|e| format!("nginx.skip_patterns: {}", e))
    }
}
