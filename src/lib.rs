//! taskflow-jobs
//!
//! Background job execution for the taskflow service: job descriptors,
//! a scheduler facade over a pluggable queue backend, and the built-in
//! maintenance and notification jobs.

use shadow_rs::shadow;
shadow!(build);

pub mod cli;
pub mod config;
pub mod jobs;
pub mod logger;

pub fn pkg_version() -> &'static str {
    build::PKG_VERSION
}

pub fn clap_long_version() -> &'static str {
    build::CLAP_LONG_VERSION
}
