//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured host + port
//!     → listener.rs (parse, bind, report Bind vs Accept failures)
//!     → knock accept loops / protected service accept loop
//! ```
//!
//! # Design Decisions
//! - Bind is awaited up front so callers know when a surface is live
//! - A failed bind disables one listener, never the process

pub mod listener;

pub use listener::{bind, ListenerError};
