//! re-metrics-core
//!
//! Measures how hard a compiled binary is to reverse engineer. Text listings
//! from the standard binutils tools are normalized once, fed through a fixed
//! set of metric extractors and obfuscation detectors, and folded into three
//! bounded scores plus a reverse-engineering time estimate.
//!
//! All substantive logic lives here so it can be tested without the tools
//! installed; the `re-bench` CLI is a thin frontend.

pub mod analysis;
pub mod config;
pub mod db;
pub mod model;
pub mod services;
pub mod util;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
