//! In-memory fakes for exercising the engine without Postgres or Shopify.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use clientele_core::{CompanyId, CustomerId};

use crate::db::RepositoryError;
use crate::models::{Company, CompanyAddress, Customer, CustomerFields};
use crate::shopify::{CustomerFeed, ExternalCustomer, FeedError};

use super::store::StoreGateway;

/// A customer row as held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub external_id: Option<String>,
    pub fields: CustomerFields,
    pub company_ids: BTreeSet<CompanyId>,
}

#[derive(Default)]
struct Inner {
    companies: Vec<Company>,
    customers: Vec<CustomerRecord>,
    next_company_id: i32,
    next_customer_id: i32,
    writes: usize,
    fail_customer_writes: HashSet<String>,
}

/// An in-memory [`StoreGateway`] mirroring the real store's semantics:
/// customer creates upsert on external id, association writes are a union,
/// company names are matched but not unique-constrained.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// All companies, in creation order.
    pub fn companies(&self) -> Vec<Company> {
        self.inner.lock().unwrap().companies.clone()
    }

    /// All customers, in creation order.
    pub fn customers(&self) -> Vec<CustomerRecord> {
        self.inner.lock().unwrap().customers.clone()
    }

    /// Find a company by name.
    pub fn find_company(&self, name: &str) -> Option<Company> {
        self.inner
            .lock()
            .unwrap()
            .companies
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    /// Total gateway writes since construction (seeding not counted).
    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes
    }

    /// Make every customer write for this external id fail.
    pub fn fail_customer_writes_for(&self, external_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_customer_writes
            .insert(external_id.to_string());
    }

    /// Seed a company as if created through the API.
    pub fn seed_company(&self, name: &str, city: &str) -> CompanyId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_company_id += 1;
        let id = CompanyId::new(inner.next_company_id);
        inner.companies.push(Company {
            id,
            name: name.to_string(),
            address1: String::new(),
            address2: String::new(),
            city: city.to_string(),
            province: String::new(),
        });
        id
    }

    /// Seed a synced customer with an existing association set.
    pub fn seed_customer(&self, external_id: &str, company_ids: &[CompanyId]) -> CustomerId {
        let mut inner = self.inner.lock().unwrap();
        inner.next_customer_id += 1;
        let id = CustomerId::new(inner.next_customer_id);
        inner.customers.push(CustomerRecord {
            id,
            external_id: Some(external_id.to_string()),
            fields: CustomerFields::default(),
            company_ids: company_ids.iter().copied().collect(),
        });
        id
    }
}

fn simulated_failure() -> RepositoryError {
    RepositoryError::Conflict("simulated store failure".to_string())
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn find_company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        Ok(self.find_company(name))
    }

    async fn create_company(
        &self,
        name: &str,
        address: &CompanyAddress,
    ) -> Result<Company, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.writes += 1;
        inner.next_company_id += 1;
        let company = Company {
            id: CompanyId::new(inner.next_company_id),
            name: name.to_string(),
            address1: address.address1.clone(),
            address2: address.address2.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
        };
        inner.companies.push(company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        address: &CompanyAddress,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        inner.writes += 1;
        let company = inner
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        company.address1 = address.address1.clone();
        company.address2 = address.address2.clone();
        company.city = address.city.clone();
        company.province = address.province.clone();
        Ok(())
    }

    async fn find_customer_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let inner = self.inner.lock().unwrap();
        let record = inner
            .customers
            .iter()
            .find(|c| c.external_id.as_deref() == Some(external_id));

        Ok(record.map(|record| Customer {
            id: record.id,
            external_id: record.external_id.clone(),
            first_name: record.fields.first_name.clone(),
            last_name: record.fields.last_name.clone(),
            email: record.fields.email.clone(),
            phone: record.fields.phone.clone(),
            companies: inner
                .companies
                .iter()
                .filter(|c| record.company_ids.contains(&c.id))
                .cloned()
                .collect(),
        }))
    }

    async fn create_customer(
        &self,
        external_id: &str,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<CustomerId, RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_customer_writes.contains(external_id) {
            return Err(simulated_failure());
        }
        inner.writes += 1;

        // Keyed on external id: a retried create becomes an update.
        if let Some(record) = inner
            .customers
            .iter_mut()
            .find(|c| c.external_id.as_deref() == Some(external_id))
        {
            record.fields = fields.clone();
            record.company_ids.extend(company_ids.iter().copied());
            return Ok(record.id);
        }

        inner.next_customer_id += 1;
        let id = CustomerId::new(inner.next_customer_id);
        inner.customers.push(CustomerRecord {
            id,
            external_id: Some(external_id.to_string()),
            fields: fields.clone(),
            company_ids: company_ids.iter().copied().collect(),
        });
        Ok(id)
    }

    async fn update_customer_with_associations(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().unwrap();
        let failing = {
            let record = inner
                .customers
                .iter()
                .find(|c| c.id == id)
                .ok_or(RepositoryError::NotFound)?;
            record
                .external_id
                .as_ref()
                .is_some_and(|ext| inner.fail_customer_writes.contains(ext))
        };
        if failing {
            return Err(simulated_failure());
        }
        inner.writes += 1;

        let record = inner
            .customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        record.fields = fields.clone();
        record.company_ids.extend(company_ids.iter().copied());
        Ok(())
    }
}

/// A feed that always returns the same snapshot.
pub struct StaticFeed {
    customers: Vec<ExternalCustomer>,
}

impl StaticFeed {
    pub fn new(customers: Vec<ExternalCustomer>) -> Self {
        Self { customers }
    }
}

#[async_trait]
impl CustomerFeed for StaticFeed {
    async fn fetch_all(&self) -> Result<Vec<ExternalCustomer>, FeedError> {
        Ok(self.customers.clone())
    }
}

/// A feed that is always unavailable.
pub struct FailingFeed;

#[async_trait]
impl CustomerFeed for FailingFeed {
    async fn fetch_all(&self) -> Result<Vec<ExternalCustomer>, FeedError> {
        Err(FeedError::Status(503))
    }
}

/// A feed that parks inside `fetch_all` until released, for observing a
/// pass while it is in flight.
pub struct GatedFeed {
    customers: Vec<ExternalCustomer>,
    started: Notify,
    release: Notify,
}

impl GatedFeed {
    pub fn new(customers: Vec<ExternalCustomer>) -> Self {
        Self {
            customers,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Wait until a pass has entered `fetch_all`.
    pub async fn wait_until_started(&self) {
        self.started.notified().await;
    }

    /// Let the parked `fetch_all` return.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl CustomerFeed for GatedFeed {
    async fn fetch_all(&self) -> Result<Vec<ExternalCustomer>, FeedError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.customers.clone())
    }
}
