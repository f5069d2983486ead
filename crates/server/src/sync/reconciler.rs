//! Merge-plan construction and application for one reconciliation pass.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use clientele_core::CompanyId;

use crate::db::RepositoryError;
use crate::models::{CompanyAddress, CustomerFields};
use crate::shopify::ExternalCustomer;

use super::matcher::EntityMatcher;
use super::store::StoreGateway;

/// Counters and failures for one completed pass.
///
/// A pass over zero external records is a successful no-op, not an error;
/// per-customer failures land in `failures` without aborting the rest.
#[derive(Debug, Default, Serialize)]
pub struct PassSummary {
    /// Customers created this pass.
    pub customers_created: usize,
    /// Customers updated in place this pass.
    pub customers_updated: usize,
    /// Companies created this pass.
    pub companies_created: usize,
    /// Companies updated in place this pass.
    pub companies_updated: usize,
    /// Customers whose merge failed, with reasons.
    pub failures: Vec<PassFailure>,
}

/// A customer whose merge plan could not be applied.
///
/// The customer's partially applied state (if any) is left for the next
/// pass to heal; merges are idempotent, so re-syncing is the retry.
#[derive(Debug, Serialize)]
pub struct PassFailure {
    /// Directory identifier of the failed customer.
    pub external_id: String,
    /// Why the merge failed.
    pub reason: String,
}

/// What one customer's merge did, used to aggregate the pass counters.
#[derive(Debug, Default)]
struct MergeOutcome {
    customer_created: bool,
    companies_created: usize,
    companies_updated: usize,
}

/// Applies merge plans against the store, one bounded batch at a time.
pub struct Reconciler<S> {
    store: Arc<S>,
    worker_count: usize,
}

impl<S: StoreGateway + 'static> Reconciler<S> {
    /// Create a reconciler over the given gateway.
    ///
    /// `worker_count` bounds how many customers merge concurrently; it is
    /// clamped to at least 1.
    #[must_use]
    pub fn new(store: Arc<S>, worker_count: usize) -> Self {
        Self {
            store,
            worker_count: worker_count.max(1),
        }
    }

    /// Run one pass over a complete feed snapshot.
    ///
    /// Customers merge concurrently on a bounded pool; within one customer
    /// the plan is strictly ordered (company upserts, then the customer
    /// upsert with its association set). Errors are captured at the
    /// customer boundary and the pass continues.
    #[instrument(skip_all, fields(customers = customers.len()))]
    pub async fn run(&self, customers: Vec<ExternalCustomer>) -> PassSummary {
        if customers.is_empty() {
            info!("feed snapshot empty, nothing to reconcile");
            return PassSummary::default();
        }

        // Company name is a matching key without a unique constraint, so a
        // concurrent find-or-create for the same name could insert the same
        // company twice. Company upserts therefore serialize across
        // workers; customer writes stay concurrent.
        let company_lock = Arc::new(Mutex::new(()));

        let results = stream::iter(customers.into_iter().map(|customer| {
            let store = Arc::clone(&self.store);
            let company_lock = Arc::clone(&company_lock);
            async move {
                let result = merge_customer(store.as_ref(), &company_lock, &customer).await;
                (customer.external_id, result)
            }
        }))
        .buffer_unordered(self.worker_count)
        .collect::<Vec<_>>()
        .await;

        let mut summary = PassSummary::default();
        for (external_id, result) in results {
            match result {
                Ok(outcome) => {
                    if outcome.customer_created {
                        summary.customers_created += 1;
                    } else {
                        summary.customers_updated += 1;
                    }
                    summary.companies_created += outcome.companies_created;
                    summary.companies_updated += outcome.companies_updated;
                }
                Err(e) => {
                    // Left as-is for the next pass; flagged for manual review.
                    warn!(external_id = %external_id, error = %e, "customer merge failed");
                    summary.failures.push(PassFailure {
                        external_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            customers_created = summary.customers_created,
            customers_updated = summary.customers_updated,
            companies_created = summary.companies_created,
            companies_updated = summary.companies_updated,
            failed = summary.failures.len(),
            "reconciliation pass complete"
        );

        summary
    }
}

/// Apply one customer's merge plan.
///
/// Addresses are walked in feed order; when several addresses within this
/// customer name the same company, the later address overwrites the earlier
/// one (defined tie-break). Company upserts complete before the customer's
/// association set is written.
async fn merge_customer<S: StoreGateway + ?Sized>(
    store: &S,
    company_lock: &Mutex<()>,
    customer: &ExternalCustomer,
) -> Result<MergeOutcome, RepositoryError> {
    let matcher = EntityMatcher::new(store);
    let mut outcome = MergeOutcome::default();
    let mut company_ids: Vec<CompanyId> = Vec::new();

    for address in &customer.addresses {
        let Some(name) = address.company_name() else {
            continue;
        };

        let target = CompanyAddress {
            address1: address.address1.clone(),
            address2: address.address2.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
        };

        let _guard = company_lock.lock().await;
        let company_id = match matcher.match_company(name).await? {
            Some(company) => {
                store.update_company(company.id, &target).await?;
                outcome.companies_updated += 1;
                company.id
            }
            None => {
                let company = store.create_company(name, &target).await?;
                outcome.companies_created += 1;
                company.id
            }
        };

        if !company_ids.contains(&company_id) {
            company_ids.push(company_id);
        }
    }

    let fields = CustomerFields {
        first_name: customer.first_name.clone(),
        last_name: customer.last_name.clone(),
        email: customer.email.clone(),
        phone: customer.phone.clone(),
    };

    match matcher.match_customer(&customer.external_id).await? {
        Some(existing) => {
            store
                .update_customer_with_associations(existing.id, &fields, &company_ids)
                .await?;
        }
        None => {
            store
                .create_customer(&customer.external_id, &fields, &company_ids)
                .await?;
            outcome.customer_created = true;
        }
    }

    Ok(outcome)
}
