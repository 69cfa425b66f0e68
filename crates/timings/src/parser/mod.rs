/// Log line parsing into monitoring metrics
///
/// Each parser turns one raw access-log line into at most one metric tuple
/// `(metric_name, timestamp, value, attributes)`.
///
/// # Architecture
///
/// - `traits.rs`: `LogParser` and the injected `ParseReporter`
/// - `model.rs`: metric tuple, values and parse errors
/// - `formats/`: the Couch and Nginx parsers
/// - `sanitize.rs`: ordered URL rewrite rules collapsing ids into `*`
/// - `timestamp.rs`: wall-clock timestamps to epoch seconds
/// - `metrics.rs`: per-run outcome counters
///
/// # Guarantees
///
/// Parsers hold no mutable state and never panic on input. A line yields a
/// metric, an intentional skip, or exactly one report to the `ParseReporter`.

pub mod traits;
pub mod model;
pub mod formats;
pub mod sanitize;
pub mod timestamp;
pub mod metrics;

// Re-export commonly used types
pub use traits::{LineOutcome, LogParser, ParseReporter, TracingReporter};
pub use model::{Attributes, LogFormat, MetricTuple, MetricType, MetricValue, ParseError, RuleError};
pub use sanitize::{UrlSanitizer, WILDCARD};
pub use timestamp::TimeBasis;

// Constants
pub const MAX_LINE_SIZE: usize = 1_048_576; // 1MB
