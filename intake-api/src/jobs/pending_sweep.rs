//! Pending Sweep Background Task
//!
//! Wizard answers live in memory until the visitor commits. Visitors who walk
//! away leave a record behind, and possibly uploads on disk from step 7. This
//! task periodically removes records idle past the pending TTL and deletes
//! their files.
//!
//! Readers already treat an expired record as absent, so the sweep only
//! reclaims memory and disk; correctness does not depend on its timing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use intake_core::Timestamp;
use intake_storage::FileStore;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::constants::DEFAULT_SWEEP_INTERVAL_SECS;
use crate::session::PendingStore;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the pending sweep background task.
#[derive(Debug, Clone)]
pub struct PendingSweepConfig {
    /// How often to look for expired records (default: 5 minutes)
    pub check_interval: Duration,

    /// Whether to log each removed record (default: true)
    pub log_removals: bool,
}

impl Default for PendingSweepConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            log_removals: true,
        }
    }
}

impl PendingSweepConfig {
    /// Create PendingSweepConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `INTAKE_SWEEP_INTERVAL_SECS`: How often to sweep (default: 300)
    /// - `INTAKE_SWEEP_LOG_REMOVALS`: Whether to log removals (default: true)
    pub fn from_env() -> Self {
        let check_interval = Duration::from_secs(
            std::env::var("INTAKE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
        );

        let log_removals = std::env::var("INTAKE_SWEEP_LOG_REMOVALS")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            check_interval,
            log_removals,
        }
    }

    /// Short interval for local runs.
    pub fn development() -> Self {
        Self {
            check_interval: Duration::from_secs(30),
            log_removals: true,
        }
    }

    pub fn production() -> Self {
        Self {
            check_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            log_removals: false,
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for sweep activity since startup.
#[derive(Debug, Default)]
pub struct PendingSweepMetrics {
    /// Expired records removed from the pending store
    pub records_expired: AtomicU64,

    /// Uploads deleted on behalf of expired records
    pub files_removed: AtomicU64,

    /// Sweep cycles completed
    pub sweep_cycles: AtomicU64,

    /// Uploads that could not be deleted
    pub sweep_errors: AtomicU64,
}

impl PendingSweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all metrics.
    pub fn snapshot(&self) -> PendingSweepSnapshot {
        PendingSweepSnapshot {
            records_expired: self.records_expired.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            sweep_cycles: self.sweep_cycles.load(Ordering::Relaxed),
            sweep_errors: self.sweep_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of sweep metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSweepSnapshot {
    pub records_expired: u64,
    pub files_removed: u64,
    pub sweep_cycles: u64,
    pub sweep_errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Background task that periodically sweeps expired wizard records.
///
/// Runs until the shutdown signal flips to `true` and returns the metrics
/// collected over its lifetime.
pub async fn pending_sweep_task(
    pending: PendingStore,
    files: FileStore,
    config: PendingSweepConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<PendingSweepMetrics> {
    let metrics = Arc::new(PendingSweepMetrics::new());

    let mut sweep_interval = interval(config.check_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        check_interval_secs = config.check_interval.as_secs(),
        "Pending sweep task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                // A dropped sender also means shutdown.
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Pending sweep task shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                sweep_once(&pending, &files, &config, &metrics, Utc::now()).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        records_expired = snapshot.records_expired,
        files_removed = snapshot.files_removed,
        sweep_cycles = snapshot.sweep_cycles,
        sweep_errors = snapshot.sweep_errors,
        "Pending sweep task completed"
    );

    metrics
}

/// Run one sweep cycle as of `now`. Returns how many records were removed.
pub async fn sweep_once(
    pending: &PendingStore,
    files: &FileStore,
    config: &PendingSweepConfig,
    metrics: &PendingSweepMetrics,
    now: Timestamp,
) -> usize {
    let expired = pending.remove_expired(now);

    for record in &expired {
        let paths: Vec<String> = record.stored_paths().map(str::to_owned).collect();
        let removed = files.remove_all(&paths).await;
        let failed = paths.len().saturating_sub(removed);

        metrics
            .files_removed
            .fetch_add(removed as u64, Ordering::Relaxed);
        metrics
            .sweep_errors
            .fetch_add(failed as u64, Ordering::Relaxed);

        if config.log_removals {
            tracing::info!(
                last_touched = %record.last_touched,
                files_removed = removed,
                files_failed = failed,
                "Swept expired wizard record"
            );
        }
    }

    metrics
        .records_expired
        .fetch_add(expired.len() as u64, Ordering::Relaxed);
    metrics.sweep_cycles.fetch_add(1, Ordering::Relaxed);

    if !expired.is_empty() {
        tracing::debug!(
            swept = expired.len(),
            remaining = pending.len(),
            "Pending sweep cycle finished"
        );
    }

    expired.len()
}

// ============================================================================
// TESTS
// ============================================================================
