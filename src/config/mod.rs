//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (--bind, --log-level)
//!     → validation.rs (semantic checks)
//!     → InspectorConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Every field has a default, so running without a file is the common case
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CaptureConfig, InspectorConfig, ListenerConfig, ObservabilityConfig};
pub use validation::{validate_config, ValidationError};
