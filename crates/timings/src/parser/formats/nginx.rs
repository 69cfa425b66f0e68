use regex::Regex;

use crate::filter::{paths, FilterEngine};
use crate::parser::model::{MetricType, MetricValue, RuleError};
use crate::parser::sanitize::UrlSanitizer;
use crate::parser::timestamp::{parse_naive, parse_offset, TimeBasis};
use crate::parser::traits::{LogFormat, LogParser, MetricTuple, ParseError};

pub const TIMINGS_METRIC: &str = "nginx.timings";
pub const APDEX_METRIC: &str = "nginx.apdex";
pub const REQUESTS_METRIC: &str = "nginx.requests";

/// Satisfied threshold used when none is configured.
pub const DEFAULT_APDEX_SATISFIED_SECS: f64 = 3.0;

const DATE_FORMAT: &str = "%d/%b/%Y:%H:%M:%S";

/// Captures the tenant slug of `/a/<domain>/...` paths.
const TENANT_DOMAIN: &str = r"^/a/([0-9a-z-]+)";

/// Which metric a [`NginxLogParser`] emits for each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NginxMetric {
    /// Raw request duration (gauge)
    Timings,
    /// Apdex score of the request duration (gauge)
    Apdex,
    /// One per request, with a `url_group` (counter)
    Requests,
}

/// Apdex thresholds: satisfied up to `T`, tolerating up to `4T`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Apdex {
    satisfied_secs: f64,
}

impl Apdex {
    pub fn new(satisfied_secs: f64) -> Self {
        Self { satisfied_secs }
    }

    pub fn tolerating_secs(&self) -> f64 {
        4.0 * self.satisfied_secs
    }

    pub fn score(&self, request_seconds: f64) -> f64 {
        if request_seconds <= self.satisfied_secs {
            1.0
        } else if request_seconds <= self.tolerating_secs() {
            0.5
        } else {
            0.0
        }
    }
}

impl Default for Apdex {
    fn default() -> Self {
        Self::new(DEFAULT_APDEX_SATISFIED_SECS)
    }
}

/// Fields pulled out of one Nginx timing log line.
#[derive(Debug, Clone, PartialEq)]
pub struct NginxFields {
    pub timestamp: f64,
    pub domain: Option<String>,
    pub url: String,
    pub http_method: String,
    pub status_code: String,
    pub request_seconds: f64,
}

/// Parser for the Nginx timing log.
///
/// Example:
/// `[28/Oct/2015:15:18:14 +0000] GET /a/uth-rhd/api/case/ HTTP/1.1 401 0.242`
#[derive(Debug, Clone)]
pub struct NginxLogParser {
    metric: NginxMetric,
    url: UrlSanitizer,
    domain: Regex,
    skip: Option<FilterEngine>,
    apdex: Apdex,
    time_basis: TimeBasis,
}

impl NginxLogParser {
    /// Parser skipping `^/static/` paths with the default Apdex threshold.
    pub fn new(metric: NginxMetric, time_basis: TimeBasis) -> Result<Self, RuleError> {
        Ok(Self {
            metric,
            url: UrlSanitizer::application()?,
            domain: Regex::new(TENANT_DOMAIN)?,
            skip: paths::skip_paths(&[paths::Patterns::STATIC_ASSETS])?,
            apdex: Apdex::default(),
            time_basis,
        })
    }

    pub fn timings(time_basis: TimeBasis) -> Result<Self, RuleError> {
        Self::new(NginxMetric::Timings, time_basis)
    }

    pub fn apdex(time_basis: TimeBasis) -> Result<Self, RuleError> {
        Self::new(NginxMetric::Apdex, time_basis)
    }

    pub fn requests(time_basis: TimeBasis) -> Result<Self, RuleError> {
        Self::new(NginxMetric::Requests, time_basis)
    }

    pub fn with_apdex(mut self, apdex: Apdex) -> Self {
        self.apdex = apdex;
        self
    }

    /// Replace the skip patterns; an empty list skips nothing.
    pub fn with_skip_patterns<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, RuleError> {
        self.skip = paths::skip_paths(patterns)?;
        Ok(self)
    }

    /// Tokenize a line. `Ok(None)` for paths excluded by the skip patterns.
    pub fn parse_fields(&self, line: &str) -> Result<Option<NginxFields>, ParseError> {
        let pieces: Vec<&str> = line.split_whitespace().collect();

        let [date, offset, http_method, path, _protocol, status_code, request_time] = pieces.as_slice() else {
            return Err(ParseError::FieldCount {
                expected: "7",
                found: pieces.len(),
            });
        };

        if let Some(skip) = &self.skip {
            if !skip.should_include(path) {
                return Ok(None);
            }
        }

        let request_seconds: f64 = request_time
            .parse()
            .map_err(|_| ParseError::Duration(request_time.to_string()))?;

        Ok(Some(NginxFields {
            timestamp: self.timestamp(date, offset)?,
            domain: self.domain.captures(path).map(|c| c[1].to_string()),
            url: self.url.apply(path),
            http_method: http_method.to_string(),
            status_code: status_code.to_string(),
            request_seconds,
        }))
    }

    /// `[28/Oct/2015:15:18:14` + `+0000]`
    fn timestamp(&self, date: &str, offset: &str) -> Result<f64, ParseError> {
        let naive = parse_naive(date.trim_start_matches('['), DATE_FORMAT)?;
        match self.time_basis {
            TimeBasis::Logged => {
                let logged = parse_offset(offset.trim_end_matches(']'))?;
                self.time_basis.epoch_seconds_with_offset(naive, logged)
            }
            _ => self.time_basis.epoch_seconds(naive),
        }
    }
}

impl LogParser for NginxLogParser {
    fn parse(&self, line: &str) -> Result<Option<MetricTuple>, ParseError> {
        let Some(fields) = self.parse_fields(line)? else {
            return Ok(None);
        };

        let metric = match self.metric {
            NginxMetric::Timings => MetricTuple::new(
                TIMINGS_METRIC,
                fields.timestamp,
                MetricValue::Float(fields.request_seconds),
                MetricType::Gauge,
            ),
            NginxMetric::Apdex => MetricTuple::new(
                APDEX_METRIC,
                fields.timestamp,
                MetricValue::Float(self.apdex.score(fields.request_seconds)),
                MetricType::Gauge,
            ),
            NginxMetric::Requests => {
                MetricTuple::new(REQUESTS_METRIC, fields.timestamp, MetricValue::Int(1), MetricType::Counter)
                    .with("url_group", url_group(&fields.url))
            }
        };

        let mut metric = metric
            .with("url", fields.url)
            .with("http_method", fields.http_method)
            .with("status_code", fields.status_code);
        if let Some(domain) = fields.domain {
            metric = metric.with("domain", domain);
        }

        Ok(Some(metric))
    }

    fn format(&self) -> LogFormat {
        LogFormat::Nginx
    }
}

/// Coarse classification of a sanitized URL.
///
/// Only tenant URLs (`/a/*/...`) are grouped; the segment after the tenant
/// wildcard decides the group.
pub fn url_group(url: &str) -> &'static str {
    let mut segments = url.split('/').skip(1);
    match (segments.next(), segments.next(), segments.next()) {
        (Some("a"), Some("*"), Some("api")) => "api",
        (Some("a"), Some("*"), Some("cloudcare")) => "cloudcare",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::traits::testing::RecordingReporter;

    const SIMPLE: &str = "[28/Oct/2015:15:18:14 +0000] GET /a/uth-rhd/api/case/attachment/a26f2e21-5f24-48b6-b283-200a21f79bb6/VH016899R9_000839_20150922T034026.MP4 HTTP/1.1 401 0.242";
    const TOLERATING: &str = "[28/Oct/2015:15:18:14 +0000] GET /a/uth-rhd HTTP/1.1 401 3.2";
    const UNSATISFIED: &str = "[28/Oct/2015:15:18:14 +0000] GET /a/uth-rhd HTTP/1.1 401 12.2";
    const BORKED: &str = "Borked";
    const SKIPPED: &str = "[28/Oct/2015:15:18:14 +0000] GET /static/myawesomejsfile.js HTTP/1.1 200 0.242";
    const ID_NORMALIZE: &str = "[28/Oct/2015:15:18:14 +0000] GET /a/ben/modules-1/forms-2/form_data/a3ds3/uuid:abc123/ HTTP/1.1 200 0.242";
    const FORMPLAYER: &str = "[04/Sep/2016:21:31:41 +0000] POST /formplayer/navigate_menu HTTP/1.1 200 19.330";

    /// The fixtures were recorded on a host two hours east of UTC.
    fn host_basis() -> TimeBasis {
        "+02:00".parse().unwrap()
    }

    fn parse(metric: NginxMetric, line: &str) -> Option<MetricTuple> {
        NginxLogParser::new(metric, host_basis()).unwrap().parse_line(&RecordingReporter::default(), line)
    }

    // ── Timings ──────────────────────────────────────────────────

    #[test]
    fn test_basic_log_parsing() {
        let metric = parse(NginxMetric::Timings, SIMPLE).unwrap();

        assert_eq!(metric.name, "nginx.timings");
        assert_eq!(metric.timestamp, 1446038294.0);
        assert_eq!(metric.value, MetricValue::Float(0.242));
        assert_eq!(metric.attr("metric_type"), Some("gauge"));
        assert_eq!(
            metric.attr("url"),
            Some("/a/*/api/case/attachment/*/VH016899R9_000839_20150922T034026.MP4")
        );
        assert_eq!(metric.attr("status_code"), Some("401"));
        assert_eq!(metric.attr("http_method"), Some("GET"));
        assert_eq!(metric.attr("domain"), Some("uth-rhd"));
        assert!(metric.attr("url_group").is_none());
    }

    #[test]
    fn test_borked_log_line() {
        let parser = NginxLogParser::timings(host_basis()).unwrap();
        let reporter = RecordingReporter::default();
        assert!(parser.parse_line(&reporter, BORKED).is_none());
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn test_skipped_line() {
        let parser = NginxLogParser::timings(host_basis()).unwrap();
        let reporter = RecordingReporter::default();
        assert!(parser.parse_line(&reporter, SKIPPED).is_none());
        assert_eq!(reporter.count(), 0, "skips are not failures");
    }

    #[test]
    fn test_id_normalization() {
        let metric = parse(NginxMetric::Timings, ID_NORMALIZE).unwrap();
        assert_eq!(metric.attr("url"), Some("/a/*/modules-*/forms-*/form_data/*/uuid:*/"));
        assert_eq!(metric.attr("domain"), Some("ben"));
    }

    #[test]
    fn test_nginx_formplayer() {
        let metric = parse(NginxMetric::Timings, FORMPLAYER).unwrap();
        assert_eq!(metric.attr("url"), Some("/formplayer/navigate_menu"));
        assert_eq!(metric.attr("http_method"), Some("POST"));
        assert!(metric.attr("domain").is_none());
        assert_eq!(metric.value, MetricValue::Float(19.33));
    }

    #[test]
    fn test_logged_offset_basis() {
        let metric = NginxLogParser::timings(TimeBasis::Logged).unwrap().parse(SIMPLE).unwrap().unwrap();
        assert_eq!(metric.timestamp, 1446045494.0);

        let shifted = SIMPLE.replace("+0000", "+0200");
        let metric = NginxLogParser::timings(TimeBasis::Logged).unwrap().parse(&shifted).unwrap().unwrap();
        assert_eq!(metric.timestamp, 1446038294.0);
    }

    #[test]
    fn test_bad_logged_offset() {
        let line = SIMPLE.replace("+0000]", "UTC]");
        assert!(NginxLogParser::timings(TimeBasis::Logged).unwrap().parse(&line).is_err());
        // Ignored unless the logged offset is honoured
        assert!(NginxLogParser::timings(host_basis()).unwrap().parse(&line).is_ok());
    }

    #[test]
    fn test_dst_transition_hours_still_emit() {
        let parser = NginxLogParser::timings(TimeBasis::Zone(chrono_tz::Europe::Berlin)).unwrap();

        let repeated = SIMPLE.replace("28/Oct/2015:15:18:14", "25/Oct/2015:02:30:00");
        assert_eq!(parser.parse(&repeated).unwrap().unwrap().timestamp, 1445736600.0);

        let skipped = SIMPLE.replace("28/Oct/2015:15:18:14", "29/Mar/2015:02:30:00");
        assert_eq!(parser.parse(&skipped).unwrap().unwrap().timestamp, 1427592600.0);
    }

    #[test]
    fn test_bad_duration() {
        let line = SIMPLE.replace("0.242", "-");
        assert!(matches!(
            NginxLogParser::timings(host_basis()).unwrap().parse(&line),
            Err(ParseError::Duration(_))
        ));
    }

    #[test]
    fn test_bad_date() {
        let line = SIMPLE.replace("Oct", "Foo");
        assert!(matches!(
            NginxLogParser::timings(host_basis()).unwrap().parse(&line),
            Err(ParseError::Timestamp(_))
        ));
    }

    #[test]
    fn test_custom_skip_patterns() {
        let parser = NginxLogParser::timings(host_basis()).unwrap()
            .with_skip_patterns(&["^/formplayer/"])
            .unwrap();
        assert!(parser.parse(FORMPLAYER).unwrap().is_none());
        assert!(parser.parse(SKIPPED).unwrap().is_some());

        let keep_all = NginxLogParser::timings(host_basis()).unwrap()
            .with_skip_patterns::<&str>(&[])
            .unwrap();
        assert!(keep_all.parse(SKIPPED).unwrap().is_some());
    }

    // ── Apdex ────────────────────────────────────────────────────

    #[test]
    fn test_apdex_parser_satisfied() {
        let metric = parse(NginxMetric::Apdex, SIMPLE).unwrap();
        assert_eq!(metric.name, "nginx.apdex");
        assert_eq!(metric.value.as_f64(), 1.0);
        assert_eq!(metric.attr("metric_type"), Some("gauge"));
        assert_eq!(metric.attr("domain"), Some("uth-rhd"));
    }

    #[test]
    fn test_apdex_parser_tolerating() {
        let metric = parse(NginxMetric::Apdex, TOLERATING).unwrap();
        assert_eq!(metric.value.as_f64(), 0.5);
    }

    #[test]
    fn test_apdex_parser_unsatisfied() {
        let metric = parse(NginxMetric::Apdex, UNSATISFIED).unwrap();
        assert_eq!(metric.value.as_f64(), 0.0);
    }

    #[test]
    fn test_apdex_boundaries_inclusive() {
        let apdex = Apdex::new(2.0);
        assert_eq!(apdex.score(2.0), 1.0);
        assert_eq!(apdex.score(2.001), 0.5);
        assert_eq!(apdex.score(8.0), 0.5);
        assert_eq!(apdex.score(8.001), 0.0);
        assert_eq!(apdex.tolerating_secs(), 8.0);
    }

    #[test]
    fn test_apdex_configurable_threshold() {
        let parser = NginxLogParser::apdex(host_basis()).unwrap().with_apdex(Apdex::new(0.1));
        let metric = parser.parse(SIMPLE).unwrap().unwrap();
        assert_eq!(metric.value.as_f64(), 0.5);
    }

    // ── Requests ─────────────────────────────────────────────────

    #[test]
    fn test_parse_nginx_counter() {
        let metric = parse(NginxMetric::Requests, SIMPLE).unwrap();

        assert_eq!(metric.name, "nginx.requests");
        assert_eq!(metric.timestamp, 1446038294.0);
        assert_eq!(metric.value, MetricValue::Int(1));
        assert_eq!(metric.attr("metric_type"), Some("counter"));
        assert_eq!(
            metric.attr("url"),
            Some("/a/*/api/case/attachment/*/VH016899R9_000839_20150922T034026.MP4")
        );
        assert_eq!(metric.attr("url_group"), Some("api"));
        assert_eq!(metric.attr("status_code"), Some("401"));
        assert_eq!(metric.attr("http_method"), Some("GET"));
        assert_eq!(metric.attr("domain"), Some("uth-rhd"));
    }

    #[test]
    fn test_counter_skips_static() {
        assert!(parse(NginxMetric::Requests, SKIPPED).is_none());
    }

    #[test]
    fn test_get_url_group() {
        for (url, expected) in [
            ("/", "other"),
            ("/a/*/api", "api"),
            ("/a/domain", "other"),
            ("/1/2/3/4", "other"),
            ("/a/*/cloudcare", "cloudcare"),
            ("/a/*/cloudcare/apps/", "cloudcare"),
            ("/a/*/apiary", "other"),
            ("", "other"),
        ] {
            assert_eq!(url_group(url), expected, "url {url:?}");
        }
    }
}
