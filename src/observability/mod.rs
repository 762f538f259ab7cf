//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle loop, registrar, CLI
//!     → tracing events with structured fields
//!     → logging.rs subscriber (stderr, text or JSON)
//! ```

pub mod logging;

pub use logging::init_logging;
