use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{verify_csrf, CsrfForm, FormBody, QueryParams},
    middleware::SessionHandle,
    models::{
        company::{CompanyListQuery, CompanySummary, PageInfo, Pagination},
        session::AdminIdentity,
    },
    repositories::CompanyListCriteria,
    state::AppState,
    types::CompanyId,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyListResponse {
    pub items: Vec<CompanySummary>,
    pub page_info: PageInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyActionResponse {
    pub message: String,
    pub company: CompanySummary,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExtendSubscriptionForm {
    #[validate(range(min = 1, max = 36, message = "Months must be between 1 and 36"))]
    pub months: u32,
    #[serde(default)]
    pub csrf_token: String,
}

pub async fn list_companies(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<CompanyListQuery>,
) -> Result<Json<CompanyListResponse>, AppError> {
    let today = state.clock.today();
    let pagination = Pagination::new(query.page, state.config.records_per_page);
    let page = state
        .companies
        .list(&CompanyListCriteria {
            filter: query.filter,
            search: query.search,
            today,
            pagination,
        })
        .await?;

    Ok(Json(CompanyListResponse {
        page_info: PageInfo::new(pagination.page, pagination.per_page, page.total),
        items: page
            .items
            .into_iter()
            .map(|company| CompanySummary::from_company(company, today))
            .collect(),
    }))
}

pub async fn approve_company(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(session): Extension<SessionHandle>,
    Path(company_id): Path<CompanyId>,
    FormBody(form): FormBody<CsrfForm>,
) -> Result<Json<CompanyActionResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;
    if !state.companies.set_approval(company_id, true).await? {
        return Err(company_not_found());
    }
    tracing::info!(admin = %admin.username, company_id = %company_id, "company approved");
    action_response(&state, company_id, "Company approved successfully.").await
}

pub async fn reject_company(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(session): Extension<SessionHandle>,
    Path(company_id): Path<CompanyId>,
    FormBody(form): FormBody<CsrfForm>,
) -> Result<Json<CompanyActionResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;
    if !state.companies.set_approval(company_id, false).await? {
        return Err(company_not_found());
    }
    tracing::info!(admin = %admin.username, company_id = %company_id, "company rejected");
    action_response(&state, company_id, "Company rejected.").await
}

pub async fn toggle_company_active(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(session): Extension<SessionHandle>,
    Path(company_id): Path<CompanyId>,
    FormBody(form): FormBody<CsrfForm>,
) -> Result<Json<CompanyActionResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;
    let is_active = state
        .companies
        .toggle_active(company_id)
        .await?
        .ok_or_else(company_not_found)?;
    tracing::info!(admin = %admin.username, company_id = %company_id, is_active, "company active status toggled");
    let message = if is_active {
        "Company activated."
    } else {
        "Company deactivated."
    };
    action_response(&state, company_id, message).await
}

pub async fn toggle_company_featured(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(session): Extension<SessionHandle>,
    Path(company_id): Path<CompanyId>,
    FormBody(form): FormBody<CsrfForm>,
) -> Result<Json<CompanyActionResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;
    let is_featured = state
        .companies
        .toggle_featured(company_id)
        .await?
        .ok_or_else(company_not_found)?;
    tracing::info!(admin = %admin.username, company_id = %company_id, is_featured, "company featured status toggled");
    let message = if is_featured {
        "Company marked as featured."
    } else {
        "Company removed from featured."
    };
    action_response(&state, company_id, message).await
}

pub async fn extend_company_subscription(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Extension(session): Extension<SessionHandle>,
    Path(company_id): Path<CompanyId>,
    FormBody(form): FormBody<ExtendSubscriptionForm>,
) -> Result<Json<CompanyActionResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;
    form.validate()?;

    let subscription_end: NaiveDate = state
        .companies
        .extend_subscription(company_id, form.months, state.clock.today())
        .await?
        .ok_or_else(company_not_found)?;
    tracing::info!(
        admin = %admin.username,
        company_id = %company_id,
        months = form.months,
        %subscription_end,
        "company subscription extended"
    );

    let message = format!(
        "Subscription extended by {} month(s) until {}.",
        form.months, subscription_end
    );
    action_response(&state, company_id, &message).await
}

async fn action_response(
    state: &AppState,
    company_id: CompanyId,
    message: &str,
) -> Result<Json<CompanyActionResponse>, AppError> {
    let company = state
        .companies
        .find_by_id(company_id)
        .await?
        .ok_or_else(company_not_found)?;
    Ok(Json(CompanyActionResponse {
        message: message.to_string(),
        company: CompanySummary::from_company(company, state.clock.today()),
    }))
}

fn company_not_found() -> AppError {
    AppError::NotFound("Company not found".to_string())
}
