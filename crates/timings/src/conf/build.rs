//! Build: turn a validated TimingsConfig into a ready parser.

use crate::parser::formats::{Apdex, CouchLogParser, NginxLogParser, NginxMetric};
use crate::parser::LogParser;

use super::model::{ParserKind, TimingsConfig};

impl TimingsConfig {
    /// Build the parser selected by `parser`, compiling every rule up front.
    pub fn build_parser(&self) -> Result<Box<dyn LogParser>, Box<dyn std::error::Error>> {
        let metric = match self.parser {
            ParserKind::Couch => return Ok(Box::new(CouchLogParser::new(self.time_basis)?)),
            ParserKind::NginxTimings => NginxMetric::Timings,
            ParserKind::NginxApdex => NginxMetric::Apdex,
            ParserKind::NginxRequests => NginxMetric::Requests,
        };

        let parser = NginxLogParser::new(metric, self.time_basis)?
            .with_apdex(Apdex::new(self.apdex.satisfied_secs))
            .with_skip_patterns(self.nginx.skip_patterns.as_slice())?;
        Ok(Box::new(parser))
    }
}
