use crate::parser::model::{MetricType, MetricValue, RuleError};
use crate::parser::sanitize::UrlSanitizer;
use crate::parser::timestamp::{parse_naive, TimeBasis};
use crate::parser::traits::{LogFormat, LogParser, MetricTuple, ParseError};

pub const METRIC_NAME: &str = "couch.timings";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fields pulled out of one Couch proxy log line.
#[derive(Debug, Clone, PartialEq)]
pub struct CouchFields {
    pub timestamp: f64,
    pub domain: String,
    pub url: String,
    pub http_method: String,
    pub status_code: String,
    pub couch_url: String,
    pub request_seconds: f64,
}

/// Parser for CouchDB proxy request logs.
///
/// Example:
/// `2015-10-31 18:32:03,963 [:mvp-pampaida] /a/mvp-pampaida/receiver/630916e49084b142c0a5a69c3a52b9b3/ PUT None d3abf611f2acdc7b4c32f7ebf4982a88 0:00:00.191515`
///
/// Newer lines carry a content length between the status code and the couch URL.
#[derive(Debug, Clone)]
pub struct CouchLogParser {
    url: UrlSanitizer,
    couch_url: UrlSanitizer,
    time_basis: TimeBasis,
}

impl CouchLogParser {
    pub fn new(time_basis: TimeBasis) -> Result<Self, RuleError> {
        Ok(Self {
            url: UrlSanitizer::application()?,
            couch_url: UrlSanitizer::couch_database()?,
            time_basis,
        })
    }

    pub fn parse_fields(&self, line: &str) -> Result<CouchFields, ParseError> {
        let pieces: Vec<&str> = line.split_whitespace().collect();

        let (date, time, domain, url, http_method, status_code, couch_url, request_time) = match pieces.as_slice() {
            [date, time, domain, url, method, status, couch_url, request_time] => {
                (*date, *time, *domain, *url, *method, *status, *couch_url, *request_time)
            }
            [date, time, domain, url, method, status, _content_length, couch_url, request_time] => {
                (*date, *time, *domain, *url, *method, *status, *couch_url, *request_time)
            }
            _ => {
                return Err(ParseError::FieldCount {
                    expected: "8 or 9",
                    found: pieces.len(),
                })
            }
        };

        Ok(CouchFields {
            timestamp: self.timestamp(date, time)?,
            domain: strip_domain_brackets(domain).to_string(),
            url: self.url.apply(url),
            http_method: http_method.to_string(),
            status_code: status_code.to_string(),
            couch_url: self.couch_url.apply(couch_url),
            request_seconds: request_seconds(request_time)?,
        })
    }

    /// `2015-10-31` + `18:32:03,963`; the milliseconds are dropped.
    fn timestamp(&self, date: &str, time: &str) -> Result<f64, ParseError> {
        let combined = format!("{} {}", date, time);
        let without_millis = combined.split(',').next().unwrap_or_default();
        let naive = parse_naive(without_millis, DATE_FORMAT)?;
        self.time_basis.epoch_seconds(naive)
    }
}

impl LogParser for CouchLogParser {
    fn parse(&self, line: &str) -> Result<Option<MetricTuple>, ParseError> {
        let fields = self.parse_fields(line)?;

        Ok(Some(
            MetricTuple::new(METRIC_NAME, fields.timestamp, MetricValue::Float(fields.request_seconds), MetricType::Gauge)
                .with("url", fields.url)
                .with("domain", fields.domain)
                .with("http_method", fields.http_method)
                .with("status_code", fields.status_code)
                .with("couch_url", fields.couch_url),
        ))
    }

    fn format(&self) -> LogFormat {
        LogFormat::Couch
    }
}

/// `[:domain]` -> `domain`. Tokens too short to hold a domain yield `""`.
fn strip_domain_brackets(token: &str) -> &str {
    token.get(2..token.len().saturating_sub(1)).unwrap_or("")
}

/// `H:MM:SS.ffffff` -> seconds.
fn request_seconds(request_time: &str) -> Result<f64, ParseError> {
    let invalid = || ParseError::Duration(request_time.to_string());

    let mut parts = request_time.split(':');
    let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(m), Some(s), None) => (h, m, s),
        _ => return Err(invalid()),
    };

    let hours: f64 = hours.parse().map_err(|_| invalid())?;
    let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: f64 = seconds.parse().map_err(|_| invalid())?;

    Ok(seconds + 60.0 * minutes + 60.0 * 60.0 * hours)
}
