//! Company API handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use serde::Deserialize;

use clientele_core::CompanyId;

use crate::db::CompanyRepository;
use crate::error::AppError;
use crate::models::{Company, CompanyAddress};
use crate::state::AppState;

use super::MessageResponse;

/// Build the companies router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/companies", get(list_companies).post(create_company))
        .route(
            "/api/v1/companies/{id}",
            put(update_company).delete(delete_company),
        )
}

/// Request body for creating or updating a company.
#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub name: String,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
}

impl CompanyRequest {
    fn address(&self) -> CompanyAddress {
        CompanyAddress {
            address1: self.address1.clone().unwrap_or_default(),
            address2: self.address2.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            province: self.province.clone().unwrap_or_default(),
        }
    }
}

/// List all companies.
async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>, AppError> {
    let companies = CompanyRepository::new(state.pool()).list_all().await?;
    Ok(Json(companies))
}

/// Create a company.
async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<CompanyRequest>,
) -> Result<Json<Company>, AppError> {
    if body.name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let company = CompanyRepository::new(state.pool())
        .create(&body.name, &body.address())
        .await?;
    Ok(Json(company))
}

/// Update a company's name and address.
async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<CompanyRequest>,
) -> Result<Json<Company>, AppError> {
    if body.name.is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }

    let company = CompanyRepository::new(state.pool())
        .update(CompanyId::new(id), &body.name, &body.address())
        .await?;
    Ok(Json(company))
}

/// Delete a company.
async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    CompanyRepository::new(state.pool())
        .delete(CompanyId::new(id))
        .await?;
    Ok(Json(MessageResponse {
        message: "Company deleted successfully".to_string(),
    }))
}
