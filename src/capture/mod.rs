//! Request capture subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (buffer body, rebuild request with a replaying body)
//!     → form.rs (query + urlencoded + multipart values)
//!     → record.rs (JSON-or-text body, canonical headers)
//!     → next stage (echo responder or any other handler)
//!     → middleware.rs (read final status, assemble RequestLog)
//!     → sink.rs (render, write one framed record)
//! ```
//!
//! # Design Decisions
//! - Capture never changes what the next stage or the client observes
//! - Every failure in here is logged, never returned to the client
//! - Each request builds its record from request-local data only

pub mod form;
pub mod middleware;
pub mod record;
pub mod sink;

pub use form::{FormData, FormError};
pub use middleware::{capture_requests, CaptureState};
pub use record::{LoggedBody, RequestLog};
pub use sink::{LogSink, MemorySink, StdoutSink};
