//! Observability subsystem.
//!
//! Request records are the product and go through `crate::capture::sink`.
//! Everything else the process has to say (startup, warnings, failures)
//! goes through `tracing`, configured here.

pub mod logging;

pub use logging::init_logging;
