//! Company repository for database operations.

use sqlx::PgPool;

use clientele_core::CompanyId;

use super::RepositoryError;
use crate::models::{Company, CompanyAddress};

/// Internal row type for `PostgreSQL` company queries.
#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: i32,
    name: String,
    address1: String,
    address2: String,
    city: String,
    province: String,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: CompanyId::new(row.id),
            name: row.name,
            address1: row.address1,
            address2: row.address2,
            city: row.city,
            province: row.province,
        }
    }
}

/// Repository for company database operations.
pub struct CompanyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CompanyRepository<'a> {
    /// Create a new company repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all companies.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Company>, RepositoryError> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, name, address1, address2, city, province
            FROM company
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a company by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, name, address1, address2, city, province
            FROM company
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Find a company by exact name.
    ///
    /// Names are not unique in the schema; when duplicates exist the oldest
    /// row wins so repeated lookups stay deterministic.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            SELECT id, name, address1, address2, city, province
            FROM company
            WHERE name = $1
            ORDER BY id
            LIMIT 1
            ",
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Create a company.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        address: &CompanyAddress,
    ) -> Result<Company, RepositoryError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            INSERT INTO company (name, address1, address2, city, province)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, address1, address2, city, province
            ",
        )
        .bind(name)
        .bind(&address.address1)
        .bind(&address.address2)
        .bind(&address.city)
        .bind(&address.province)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Overwrite a company's address fields, leaving the name untouched.
    ///
    /// This is the sync write: address fields always take the values from
    /// the latest sighting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the company does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_address(
        &self,
        id: CompanyId,
        address: &CompanyAddress,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE company
            SET address1 = $2, address2 = $3, city = $4, province = $5, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&address.address1)
        .bind(&address.address2)
        .bind(&address.city)
        .bind(&address.province)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update a company's name and address (API edit).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the company does not exist.
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: CompanyId,
        name: &str,
        address: &CompanyAddress,
    ) -> Result<Company, RepositoryError> {
        let row = sqlx::query_as::<_, CompanyRow>(
            r"
            UPDATE company
            SET name = $2, address1 = $3, address2 = $4, city = $5, province = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, address1, address2, city, province
            ",
        )
        .bind(id)
        .bind(name)
        .bind(&address.address1)
        .bind(&address.address2)
        .bind(&address.city)
        .bind(&address.province)
        .fetch_optional(self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a company.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the company does not exist.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CompanyId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM company WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
