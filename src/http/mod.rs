//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, HTTP/1.1 + h2c)
//!     → TraceLayer
//!     → capture middleware (see crate::capture)
//!     → CatchPanicLayer
//!     → echo.rs (fixed acknowledgement)
//!     → Send to client
//! ```

pub mod echo;
pub mod server;

pub use echo::echo_handler;
pub use server::{with_capture, InspectorServer};
