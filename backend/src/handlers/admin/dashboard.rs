use axum::{extract::State, Json};
use chrono::Duration;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::company::{Company, CompanyStats, CompanySummary},
    repositories::company::expiring_until,
    state::AppState,
};

const RECENT_REGISTRATION_DAYS: i64 = 7;
const DASHBOARD_LIST_LIMIT: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub stats: CompanyStats,
    pub recent_registrations: Vec<CompanySummary>,
    pub expiring_subscriptions: Vec<CompanySummary>,
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardResponse>, AppError> {
    let today = state.clock.today();
    let since = state.clock.now_utc() - Duration::days(RECENT_REGISTRATION_DAYS);

    let stats = state.companies.stats(today).await?;
    let recent = state
        .companies
        .recent_registrations(since, DASHBOARD_LIST_LIMIT)
        .await?;
    let expiring = state
        .companies
        .expiring_subscriptions(today, expiring_until(today), DASHBOARD_LIST_LIMIT)
        .await?;

    let summarize = |companies: Vec<Company>| {
        companies
            .into_iter()
            .map(|company| CompanySummary::from_company(company, today))
            .collect::<Vec<_>>()
    };

    Ok(Json(AdminDashboardResponse {
        stats,
        recent_registrations: summarize(recent),
        expiring_subscriptions: summarize(expiring),
    }))
}
