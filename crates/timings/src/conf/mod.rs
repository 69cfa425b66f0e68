//! Conf module: configuration model, loading, and parser construction.

pub mod model;
pub mod load;
pub mod build;

pub use model::{TimingsConfig, ParserKind, ApdexConfig, NginxConfig};
