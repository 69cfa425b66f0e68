// Module structure for the access-log timings extractor.

// Core
pub mod parser;
pub mod filter;

// Process
pub mod conf;
pub mod runtime;
