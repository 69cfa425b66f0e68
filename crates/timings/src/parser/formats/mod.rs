/// Log-family parsers

pub mod couch;
pub mod nginx;

// Re-export parser implementations
pub use couch::{CouchFields, CouchLogParser};
pub use nginx::{url_group, Apdex, NginxFields, NginxLogParser, NginxMetric};
