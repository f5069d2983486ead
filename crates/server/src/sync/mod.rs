//! Directory reconciliation engine.
//!
//! One reconciliation pass pulls the full customer snapshot from the
//! external directory, decides a merge plan per customer (create or update,
//! by natural key), and applies the plans against the local store through
//! the [`StoreGateway`] contract:
//!
//! ```text
//! trigger -> CustomerFeed::fetch_all -> EntityMatcher -> Reconciler -> StoreGateway
//! ```
//!
//! Passes are idempotent: re-running against an unchanged feed produces
//! updates, never duplicates. Per-customer failures are collected into the
//! pass summary and do not abort the pass; a feed failure aborts the pass
//! before anything is written. The [`SyncScheduler`] guarantees at most one
//! pass runs at a time, whether triggered by cadence or by request.

pub mod matcher;
pub mod reconciler;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use reconciler::{PassFailure, PassSummary, Reconciler};
pub use scheduler::{SyncError, SyncScheduler};
pub use store::{PgStore, StoreGateway};
