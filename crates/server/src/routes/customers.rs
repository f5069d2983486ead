//! Customer API handlers, including the sync trigger.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clientele_core::{CompanyId, CustomerId, Email};

use crate::db::{CompanyRepository, CustomerRepository};
use crate::error::AppError;
use crate::models::{Customer, CustomerFields};
use crate::state::AppState;
use crate::sync::{PassFailure, PassSummary};

use super::MessageResponse;

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/customers",
            get(list_customers).post(create_customer),
        )
        .route("/api/v1/customers/sync", post(sync_customers))
        .route(
            "/api/v1/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route(
            "/api/v1/customers/{id}/company/{company_id}",
            post(connect_company),
        )
}

/// Query parameters for listing customers.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive match over first name, last name, and email.
    pub search: Option<String>,
}

/// Request body for creating a customer.
#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    /// Rarely supplied; present for clients that already know the
    /// directory identifier.
    pub external_id: Option<String>,
}

/// Request body for updating a customer. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Response body for the sync trigger.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub created: EntityCounts,
    pub updated: EntityCounts,
    pub failed: Vec<PassFailure>,
}

/// Per-entity counters in a sync response.
#[derive(Debug, Serialize)]
pub struct EntityCounts {
    pub customers: usize,
    pub companies: usize,
}

impl From<PassSummary> for SyncResponse {
    fn from(summary: PassSummary) -> Self {
        Self {
            created: EntityCounts {
                customers: summary.customers_created,
                companies: summary.companies_created,
            },
            updated: EntityCounts {
                customers: summary.customers_updated,
                companies: summary.companies_updated,
            },
            failed: summary.failures,
        }
    }
}

/// List customers, optionally filtered.
async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = CustomerRepository::new(state.pool())
        .list(query.search.as_deref())
        .await?;
    Ok(Json(customers))
}

/// Get a single customer with its companies.
async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Customer>, AppError> {
    CustomerRepository::new(state.pool())
        .get_by_id(CustomerId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

/// Create a customer locally and push it to the directory.
#[instrument(skip(state, body), fields(email = %body.email))]
async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let fields = CustomerFields {
        first_name: body.first_name.unwrap_or_default(),
        last_name: body.last_name.unwrap_or_default(),
        email: email.into_inner(),
        phone: body.phone.unwrap_or_default(),
    };

    let customer = CustomerRepository::new(state.pool())
        .create(&fields, body.external_id.as_deref())
        .await?;

    // Mirror the new customer out to the directory. The mutation is built
    // from JSON variables; the input never touches the query document.
    state.feed().create_customer(&fields).await?;

    Ok(Json(customer))
}

/// Update a customer's contact fields.
async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    let repo = CustomerRepository::new(state.pool());
    let existing = repo
        .get_by_id(CustomerId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    if let Some(email) = &body.email {
        Email::parse(email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    let fields = CustomerFields {
        first_name: body.first_name.unwrap_or(existing.first_name),
        last_name: body.last_name.unwrap_or(existing.last_name),
        email: body.email.unwrap_or(existing.email),
        phone: body.phone.unwrap_or(existing.phone),
    };

    let customer = repo.update(CustomerId::new(id), &fields).await?;
    Ok(Json(customer))
}

/// Delete a customer.
async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    CustomerRepository::new(state.pool())
        .delete(CustomerId::new(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "Customer deleted successfully".to_string(),
    }))
}

/// Manually associate a customer with a company.
///
/// Associations made here are never removed by sync passes.
async fn connect_company(
    State(state): State<AppState>,
    Path((id, company_id)): Path<(i32, i32)>,
) -> Result<Json<Customer>, AppError> {
    let customer_id = CustomerId::new(id);
    let company_id = CompanyId::new(company_id);

    CompanyRepository::new(state.pool())
        .get_by_id(company_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;

    let repo = CustomerRepository::new(state.pool());
    repo.get_by_id(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

    repo.connect_company(customer_id, company_id).await?;

    repo.get_by_id(customer_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}

/// Trigger a reconciliation pass.
///
/// Any completed pass is 200, with per-customer failures riding along in
/// the body. 409 means a pass is already running; 500 means the directory
/// feed could not be read at all (nothing was written).
#[instrument(skip(state))]
async fn sync_customers(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let summary = state.scheduler().trigger().await?;
    Ok(Json(summary.into()))
}
