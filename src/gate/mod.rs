//! Gate subsystem.
//!
//! # Data Flow
//!
//! ```text
//! TCP connect to the protected port
//!     → service.rs (accept, permit-bounded)
//!     → access.rs (pure grant check against the shared client table)
//!     → allowed: handler task | denied: silent close
//! ```
//!
//! # Design Decisions
//!
//! - The grant check is read-only; only knocks ever write client state
//! - Denial is indistinguishable from a closed port at the application
//!   layer, so probing the service reveals nothing about the knock scheme

pub mod access;
pub mod service;

pub use access::AccessGate;
pub use service::{default_handler, ProtectedService};
