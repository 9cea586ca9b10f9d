//! Request inspector for webhook and callback debugging.
//!
//! Accepts any request on any path, logs a structured record of it and
//! replies `{"msg":"ok"}`.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ TraceLayer ──▶ capture ──▶ CatchPanic ──▶ echo handler
//!                               │
//!                               └──▶ LogSink (stdout: one framed JSON record)
//! ```

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use capture::{LogSink, MemorySink, RequestLog, StdoutSink};
pub use config::InspectorConfig;
pub use http::InspectorServer;
pub use lifecycle::Shutdown;
