//! Command implementations behind the `re-bench` binary.
//!
//! Kept in a library target so the integration tests can call helpers
//! directly as well as driving the binary.

pub mod commands;

pub use commands::util::{load_config, print_summary};
