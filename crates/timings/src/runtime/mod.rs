//! Runtime module: process lifecycle: boot, then stream lines until EOF.

pub mod boot;
pub mod run;
