pub use super::model::{LogFormat, MetricTuple, ParseError};

/// Error-reporting capability handed to parsers.
///
/// Called exactly once for every line that fails to parse. Intentional skips
/// and empty lines never reach it.
pub trait ParseReporter: Send + Sync {
    fn report(&self, line: &str, error: &ParseError);
}

/// Reports parse failures as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ParseReporter for TracingReporter {
    fn report(&self, line: &str, error: &ParseError) {
        tracing::warn!(%error, line, "Failed to parse log line");
    }
}

/// What became of one line handed to [`LogParser::parse_line_outcome`].
#[derive(Debug)]
pub enum LineOutcome {
    Emitted(MetricTuple),
    /// Empty, or deliberately excluded by the parser
    Skipped,
    /// Malformed; already handed to the reporter
    Failed(ParseError),
}

pub trait LogParser: Send + Sync {
    /// Parse one raw log line.
    ///
    /// `Ok(None)` means the line was recognised but deliberately excluded.
    fn parse(&self, line: &str) -> Result<Option<MetricTuple>, ParseError>;

    fn format(&self) -> LogFormat;

    /// Parse a line, reporting failures instead of returning them.
    fn parse_line(&self, reporter: &dyn ParseReporter, line: &str) -> Option<MetricTuple> {
        match self.parse_line_outcome(reporter, line) {
            LineOutcome::Emitted(metric) => Some(metric),
            LineOutcome::Skipped | LineOutcome::Failed(_) => None,
        }
    }

    /// Like [`parse_line`](Self::parse_line), but tells the caller why no
    /// metric came out. A failure is reported exactly once before it is returned.
    fn parse_line_outcome(&self, reporter: &dyn ParseReporter, line: &str) -> LineOutcome {
        if line.is_empty() {
            return LineOutcome::Skipped;
        }

        match self.parse(line) {
            Ok(Some(metric)) => LineOutcome::Emitted(metric),
            Ok(None) => LineOutcome::Skipped,
            Err(e) => {
                reporter.report(line, &e);
                LineOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;
    use super::*;

    /// Reporter that remembers every failure it is handed.
    #[derive(Default)]
    pub struct RecordingReporter {
        pub reports: Mutex<Vec<(String, String)>>,
    }

    impl RecordingReporter {
        pub fn count(&self) -> usize {
            self.reports.lock().unwrap().len()
        }
    }

    impl ParseReporter for RecordingReporter {
        fn report(&self, line: &str, error: &ParseError) {
            self.reports.lock().unwrap().push((line.to_string(), error.to_string()));
        }
    }
}
