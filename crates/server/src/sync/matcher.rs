//! Natural-key matching of external records onto local rows.

use crate::db::RepositoryError;
use crate::models::{Company, Customer};

use super::store::StoreGateway;

/// Decides whether an incoming record corresponds to an existing local row.
///
/// Matching is exact-string on the natural key: directory identifier for
/// customers, name for companies. No fuzzy matching; a miss means the
/// reconciler should create. Callers are expected to consult
/// [`match_company`](Self::match_company) only for non-empty names, since
/// an address without a company name produces no company at all.
pub struct EntityMatcher<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: StoreGateway + ?Sized> EntityMatcher<'a, S> {
    /// Create a matcher over the given gateway.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Match a company by name. `None` means no local company exists yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn match_company(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        self.store.find_company_by_name(name).await
    }

    /// Match a customer by directory identifier. `None` means no local
    /// customer was ever synced under this identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn match_customer(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        self.store.find_customer_by_external_id(external_id).await
    }
}
