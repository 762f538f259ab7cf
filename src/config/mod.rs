//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated)
//!
//! On reload marker:
//!     lifecycle loop calls loader.rs again
//!     → valid config replaces the loop's timing
//!     → invalid config is logged and ignored
//! ```
//!
//! # Design Decisions
//! - All fields have defaults, so running without a file is normal
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{LifecycleConfig, ObservabilityConfig, RegistrarConfig, ServiceConfig};
