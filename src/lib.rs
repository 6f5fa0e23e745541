//! Portcullis Port-Knocking Daemon Library

pub mod config;
pub mod gate;
pub mod knock;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::PortcullisConfig;
pub use gate::{AccessGate, ProtectedService};
pub use knock::{ClientStateStore, KnockSequencer};
pub use lifecycle::Shutdown;
