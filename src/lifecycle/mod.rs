//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Service body (service_loop.rs):
//!     work unit → (every check interval) look at markers
//!         stop marker   → exit loop
//!         reload marker → reload config → remove marker → keep running
//!
//! Markers (markers.rs):
//!     <executable>.notify.stop / <executable>.notify.reload
//!     created by an operator or by `sentinel-service stop|reload`
//! ```
//!
//! # Design Decisions
//! - Polling, not signals: cancellation is cooperative
//! - Reload marker removal is best-effort; a leftover marker reloads again
//! - Loop timing uses tokio's clock so it can run on paused time

pub mod markers;
pub mod service_loop;

pub use markers::{FsMarkerStore, MarkerError, MarkerPaths, MarkerStore};
pub use service_loop::{CheckOutcome, LoopReport, LoopState, ServiceLoop};
