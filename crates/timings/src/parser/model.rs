use std::collections::BTreeMap;
use thiserror::Error;
use serde::{Serialize, Deserialize};

use crate::filter::FilterError;

/// Attribute map attached to every emitted metric.
pub type Attributes = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// CouchDB proxy request log
    Couch,
    /// Nginx access log (timing variant)
    Nginx,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Couch => "couch",
            LogFormat::Nginx => "nginx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

/// Numeric payload of a metric. Serializes as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Int(i64),
}

#[cfg(test)]
impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Float(v) => v,
            MetricValue::Int(v) => v as f64,
        }
    }
}

/// `(metric_name, timestamp, value, attributes)` as handed to the metrics emitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTuple {
    #[serde(rename = "metric")]
    pub name: &'static str,

    /// Seconds since the epoch, always integer-valued
    pub timestamp: f64,

    pub value: MetricValue,

    /// Always carries `metric_type`
    pub attributes: Attributes,
}

impl MetricTuple {
    pub fn new(name: &'static str, timestamp: f64, value: MetricValue, metric_type: MetricType) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert("metric_type".to_string(), metric_type.as_str().to_string());
        Self {
            name,
            timestamp,
            value,
            attributes,
        }
    }

    /// Builder-style attribute insert
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Expected {expected} fields, found {found}")]
    FieldCount { expected: &'static str, found: usize },

    #[error("Invalid timestamp: {0}")]
    Timestamp(String),

    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    #[error("Invalid request duration: {0}")]
    Duration(String),

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Non-UTF8 content")]
    NonUtf8,
}

/// A parser's rewrite or skip rules failed to compile.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Invalid URL rule: {0}")]
    Url(#[from] regex::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),
}
