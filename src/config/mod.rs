//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → LensConfig (validated, immutable)
//!     → handed to the layers at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the pipeline is wired once at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CaptureConfig, CorrelationConfig, FailurePolicy, LensConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, TimeoutConfig,
};
pub use validation::ValidationError;
