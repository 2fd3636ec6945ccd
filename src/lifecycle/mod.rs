//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Install logging → Build pipeline → Bind listener
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM / Ctrl-C or Shutdown::trigger → Stop accepting → Drain in-flight requests
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last, once the pipeline is known to be valid

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
