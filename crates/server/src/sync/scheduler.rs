//! Single-flight trigger and fixed cadence for reconciliation passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument};

use crate::shopify::{CustomerFeed, FeedError};

use super::reconciler::{PassSummary, Reconciler};
use super::store::StoreGateway;

/// Errors surfaced to a trigger caller.
///
/// Neither variant writes anything: `AlreadyRunning` is a fail-fast refusal
/// and `Source` aborts before the reconciler sees a single record.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A pass is already in flight; concurrent triggers are refused rather
    /// than queued.
    #[error("a reconciliation pass is already running")]
    AlreadyRunning,

    /// The directory feed could not be read; the pass counts as a total
    /// failure with nothing written.
    #[error("source feed unavailable: {0}")]
    Source(#[from] FeedError),
}

/// Fires reconciliation passes on demand and on a fixed cadence, at most
/// one at a time process-wide.
///
/// Both entry points go through [`trigger`](Self::trigger); the pass slot
/// is an atomic flag taken with compare-and-swap and released by an RAII
/// guard, so an erroring pass can never wedge the scheduler.
pub struct SyncScheduler<F, S> {
    feed: Arc<F>,
    reconciler: Reconciler<S>,
    in_flight: AtomicBool,
}

impl<F, S> SyncScheduler<F, S>
where
    F: CustomerFeed + 'static,
    S: StoreGateway + 'static,
{
    /// Create a scheduler over the given feed and reconciler.
    #[must_use]
    pub const fn new(feed: Arc<F>, reconciler: Reconciler<S>) -> Self {
        Self {
            feed,
            reconciler,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Run one reconciliation pass now.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] immediately if a pass is in
    /// flight, or [`SyncError::Source`] if the feed could not be read.
    /// A completed pass with per-customer failures is `Ok`; the failures
    /// are in the summary.
    #[instrument(skip(self))]
    pub async fn trigger(&self) -> Result<PassSummary, SyncError> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(SyncError::AlreadyRunning)?;

        let customers = self.feed.fetch_all().await?;
        info!(customers = customers.len(), "feed snapshot fetched");

        Ok(self.reconciler.run(customers).await)
    }

    /// Spawn the fixed-cadence task.
    ///
    /// The first pass fires one `period` after startup, not immediately.
    /// A tick that finds a pass already in flight (e.g. an operator-
    /// triggered one) is skipped, not queued.
    pub fn spawn_cadence(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval yields immediately on the first tick
            interval.tick().await;

            loop {
                interval.tick().await;
                match scheduler.trigger().await {
                    Ok(summary) => info!(
                        customers_created = summary.customers_created,
                        customers_updated = summary.customers_updated,
                        failed = summary.failures.len(),
                        "scheduled pass complete"
                    ),
                    Err(SyncError::AlreadyRunning) => {
                        debug!("scheduled pass skipped, another pass is running");
                    }
                    Err(e) => error!(error = %e, "scheduled pass failed"),
                }
            }
        })
    }
}

/// Holds the pass slot; releases it on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
