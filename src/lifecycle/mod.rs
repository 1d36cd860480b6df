//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build apps → Bind listeners → Spawn servers
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Servers stop accepting → In-flight requests drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then apps, listeners last
//! - One shutdown signal fans out to every server

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
