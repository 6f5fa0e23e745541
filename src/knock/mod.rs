//! Knock subsystem.
//!
//! # Data Flow
//!
//! ```text
//! TCP connect to a monitored port
//!     → listener.rs (accept, take the peer address, drop the stream)
//!     → sequencer.rs (advance or reset that client's progress)
//!     → state.rs (shared per-client table, read by the access gate)
//! ```
//!
//! # Design Decisions
//!
//! - A knock is the connection attempt itself; no payload is ever read
//! - Per-address updates are atomic, and addresses never contend with each
//!   other
//! - The client identity is the unauthenticated source address, so the whole
//!   scheme is obscurity, not authentication

pub mod listener;
pub mod sequencer;
pub mod state;

pub use listener::spawn_knock_listeners;
pub use sequencer::KnockSequencer;
pub use state::{ClientState, ClientStateStore};
