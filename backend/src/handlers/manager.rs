use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{company::CompanySummary, session::CompanyIdentity},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ManagerDashboardResponse {
    pub company: CompanySummary,
    pub description: Option<String>,
}

/// Profile and subscription status for the signed-in company manager.
pub async fn manager_dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<CompanyIdentity>,
) -> Result<Json<ManagerDashboardResponse>, AppError> {
    let company = state
        .companies
        .find_by_id(identity.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Company not found".to_string()))?;
    let description = company.description.clone();

    Ok(Json(ManagerDashboardResponse {
        company: CompanySummary::from_company(company, state.clock.today()),
        description,
    }))
}
