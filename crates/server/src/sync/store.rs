//! Local store gateway contract and its `PostgreSQL` implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use clientele_core::{CompanyId, CustomerId};

use crate::db::{CompanyRepository, CustomerRepository, RepositoryError};
use crate::models::{Company, CompanyAddress, Customer, CustomerFields};

/// The store operations a reconciliation pass needs, each atomic with
/// respect to concurrent callers.
///
/// Creates are keyed on natural keys where the schema allows it (customer
/// external id), so a retried create is a no-op update. Association writes
/// are a set union at the storage layer: a pass can add associations but
/// can never drop ones made through the API.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Look up a company by exact name.
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError>;

    /// Create a company with the given name and address fields.
    async fn create_company(
        &self,
        name: &str,
        address: &CompanyAddress,
    ) -> Result<Company, RepositoryError>;

    /// Overwrite a company's address fields.
    async fn update_company(
        &self,
        id: CompanyId,
        address: &CompanyAddress,
    ) -> Result<(), RepositoryError>;

    /// Look up a customer by directory identifier.
    async fn find_customer_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, RepositoryError>;

    /// Create a customer from a directory sighting, with its association set.
    async fn create_customer(
        &self,
        external_id: &str,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<CustomerId, RepositoryError>;

    /// Overwrite a customer's contact fields and union `company_ids` into
    /// its association set.
    async fn update_customer_with_associations(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed gateway delegating to the repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new gateway over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreGateway for PgStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        CompanyRepository::new(&self.pool).find_by_name(name).await
    }

    async fn create_company(
        &self,
        name: &str,
        address: &CompanyAddress,
    ) -> Result<Company, RepositoryError> {
        CompanyRepository::new(&self.pool).create(name, address).await
    }

    async fn update_company(
        &self,
        id: CompanyId,
        address: &CompanyAddress,
    ) -> Result<(), RepositoryError> {
        CompanyRepository::new(&self.pool)
            .update_address(id, address)
            .await
    }

    async fn find_customer_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        CustomerRepository::new(&self.pool)
            .find_by_external_id(external_id)
            .await
    }

    async fn create_customer(
        &self,
        external_id: &str,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<CustomerId, RepositoryError> {
        CustomerRepository::new(&self.pool)
            .create_synced(external_id, fields, company_ids)
            .await
    }

    async fn update_customer_with_associations(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<(), RepositoryError> {
        CustomerRepository::new(&self.pool)
            .update_synced(id, fields, company_ids)
            .await
    }
}
