//! Marker-driven background service library.

pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod registrar;

pub use config::ServiceConfig;
pub use lifecycle::ServiceLoop;
pub use registrar::{ServiceRegistrar, SystemdRegistrar};
