//! Customer repository for database operations.
//!
//! Reconciliation-facing writes (`create_synced`, `update_synced`) are the
//! storage half of the gateway contract: creates are keyed on `external_id`
//! so a retried create degrades to a no-op update, and association writes
//! are insert-only so the customer/company relation is a set union, never a
//! replacement.

use std::collections::HashMap;

use sqlx::PgPool;

use clientele_core::{CompanyId, CustomerId};

use super::RepositoryError;
use crate::models::{Company, Customer, CustomerFields};

/// Internal row type for `PostgreSQL` customer queries.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    external_id: Option<String>,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
}

impl CustomerRow {
    fn into_customer(self, companies: Vec<Company>) -> Customer {
        Customer {
            id: CustomerId::new(self.id),
            external_id: self.external_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            companies,
        }
    }
}

/// Internal row type for association queries (join against `company`).
#[derive(Debug, sqlx::FromRow)]
struct AssociationRow {
    customer_id: i32,
    id: i32,
    name: String,
    address1: String,
    address2: String,
    city: String,
    province: String,
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List customers, optionally filtered by a case-insensitive search over
    /// first name, last name, and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Customer>, RepositoryError> {
        let rows = if let Some(search) = search {
            let pattern = format!("%{search}%");
            sqlx::query_as::<_, CustomerRow>(
                r"
                SELECT id, external_id, first_name, last_name, email, phone
                FROM customer
                WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email LIKE $1
                ORDER BY id
                ",
            )
            .bind(&pattern)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as::<_, CustomerRow>(
                r"
                SELECT id, external_id, first_name, last_name, email, phone
                FROM customer
                ORDER BY id
                ",
            )
            .fetch_all(self.pool)
            .await?
        };

        self.attach_companies(rows).await
    }

    /// Get a customer by its local ID, with associated companies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, external_id, first_name, last_name, email, phone
            FROM customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_companies(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Find a customer by its directory identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, external_id, first_name, last_name, email, phone
            FROM customer
            WHERE external_id = $1
            ",
        )
        .bind(external_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_companies(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Create a customer through the API.
    ///
    /// `external_id` is normally absent for locally created customers; when
    /// a caller supplies one it must not collide with an existing row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the external id is taken.
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        fields: &CustomerFields,
        external_id: Option<&str>,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customer (external_id, first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, external_id, first_name, last_name, email, phone
            ",
        )
        .bind(external_id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .fetch_one(self.pool)
        .await
        .map_err(unique_violation_to_conflict)?;

        Ok(row.into_customer(vec![]))
    }

    /// Update a customer's contact fields through the API.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE customer
            SET first_name = $2, last_name = $3, email = $4, phone = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, external_id, first_name, last_name, email, phone
            ",
        )
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => {
                let mut customers = self.attach_companies(vec![row]).await?;
                customers.pop().ok_or(RepositoryError::NotFound)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Delete a customer. Associations go with it (cascade).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CustomerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Associate a customer with a company (manual API association).
    ///
    /// Already-associated pairs are a no-op; sync passes never remove rows
    /// written here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn connect_company(
        &self,
        customer_id: CustomerId,
        company_id: CompanyId,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO customer_company (customer_id, company_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(customer_id)
        .bind(company_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Create a customer from a directory sighting.
    ///
    /// Keyed on `external_id`: if a concurrent or previously half-committed
    /// create already inserted the row, this degrades to an update of the
    /// same row instead of a duplicate. Fields and associations commit in
    /// one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_synced(
        &self,
        external_id: &str,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<CustomerId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO customer (external_id, first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                updated_at = now()
            RETURNING id
            ",
        )
        .bind(external_id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .fetch_one(&mut *tx)
        .await?;

        insert_associations(&mut tx, CustomerId::new(id), company_ids).await?;

        tx.commit().await?;
        Ok(CustomerId::new(id))
    }

    /// Update a customer from a directory sighting.
    ///
    /// Contact fields are overwritten; `company_ids` are unioned into the
    /// existing association set. Both commit in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn update_synced(
        &self,
        id: CustomerId,
        fields: &CustomerFields,
        company_ids: &[CompanyId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE customer
            SET first_name = $2, last_name = $3, email = $4, phone = $5, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        insert_associations(&mut tx, id, company_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Load companies for a batch of customer rows and assemble the models.
    async fn attach_companies(
        &self,
        rows: Vec<CustomerRow>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let associations = sqlx::query_as::<_, AssociationRow>(
            r"
            SELECT cc.customer_id, co.id, co.name, co.address1, co.address2, co.city, co.province
            FROM customer_company cc
            JOIN company co ON co.id = cc.company_id
            WHERE cc.customer_id = ANY($1)
            ORDER BY co.id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_customer: HashMap<i32, Vec<Company>> = HashMap::new();
        for row in associations {
            by_customer
                .entry(row.customer_id)
                .or_default()
                .push(Company {
                    id: CompanyId::new(row.id),
                    name: row.name,
                    address1: row.address1,
                    address2: row.address2,
                    city: row.city,
                    province: row.province,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let companies = by_customer.remove(&row.id).unwrap_or_default();
                row.into_customer(companies)
            })
            .collect())
    }
}

/// Insert associations as a set union (existing pairs are untouched).
async fn insert_associations(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    customer_id: CustomerId,
    company_ids: &[CompanyId],
) -> Result<(), RepositoryError> {
    for company_id in company_ids {
        sqlx::query(
            r"
            INSERT INTO customer_company (customer_id, company_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(customer_id)
        .bind(company_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
fn unique_violation_to_conflict(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict("external id already in use".to_string())
        }
        _ => RepositoryError::Database(err),
    }
}
