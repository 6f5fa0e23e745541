//! Lifecycle management subsystem.
//!
//! # Data Flow
//!
//! ```text
//! Startup (main):
//!     Load config → Validate → Init observability → Bind listeners
//!     → Serve
//!
//! Shutdown (shutdown.rs + signals.rs):
//!     SIGTERM/SIGINT → shutdown broadcast → protected service stops
//!     accepting → summary logged → exit
//! ```
//!
//! # Design Decisions
//! - Knock listeners are not drained; they die with the process
//! - Client state is memory-only, so exiting forgets every grant

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
