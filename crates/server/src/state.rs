//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::shopify::FeedClient;
use crate::sync::{PgStore, Reconciler, SyncScheduler};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; owns the database pool, the directory feed
/// client, and the reconciliation scheduler. The feed client and the store
/// are constructed here and passed into the scheduler explicitly; there is
/// no ambient global session.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    feed: Arc<FeedClient>,
    scheduler: Arc<SyncScheduler<FeedClient, PgStore>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: &ServerConfig, pool: PgPool) -> Self {
        let feed = Arc::new(FeedClient::new(&config.shopify));
        let store = Arc::new(PgStore::new(pool.clone()));
        let reconciler = Reconciler::new(store, config.sync.worker_count);
        let scheduler = Arc::new(SyncScheduler::new(Arc::clone(&feed), reconciler));

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                feed,
                scheduler,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the directory feed client.
    #[must_use]
    pub fn feed(&self) -> &FeedClient {
        &self.inner.feed
    }

    /// Get a reference to the reconciliation scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<SyncScheduler<FeedClient, PgStore>> {
        &self.inner.scheduler
    }
}
