//! Connectivity supervision
//!
//! Link events in, connect commands out. The current state is published
//! through [`SharedConnectivity`] for the UI and the init sequencer.

pub mod backoff;
pub mod shared;
pub mod state;
pub mod supervisor;

pub use backoff::{BackoffPolicy, ReconnectBackoff};
pub use shared::SharedConnectivity;
pub use state::{ConnectivityState, LinkEvent};
pub use supervisor::{ConnectRequest, ConnectivitySupervisor};

/// Default bounded wait for the first connection during bring-up
pub const CONNECT_TIMEOUT_MS: u32 = 10_000;
