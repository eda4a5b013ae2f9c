//! Background Jobs for the intake service
//!
//! - `pending_sweep`: drops wizard records idle past their TTL and deletes
//!   the uploads they were holding
//!
//! # Usage
//!
//! ```ignore
//! use intake_api::jobs::{pending_sweep_task, PendingSweepConfig};
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! tokio::spawn(pending_sweep_task(
//!     state.pending.clone(),
//!     state.files.clone(),
//!     PendingSweepConfig::from_env(),
//!     shutdown_rx,
//! ));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! ```

pub mod pending_sweep;

pub use pending_sweep::{
    pending_sweep_task, sweep_once, PendingSweepConfig, PendingSweepMetrics, PendingSweepSnapshot,
};
