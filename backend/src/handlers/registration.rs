use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::Days;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::common::{verify_csrf, FormBody},
    middleware::SessionHandle,
    models::company::{Company, NewCompany, RegisterCompanyForm},
    repositories::{common::is_unique_violation, CompanyRepository},
    state::AppState,
    types::CompanyId,
    utils::password::hash_password,
};

const EMAIL_TAKEN: &str = "Email already registered";

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationResponse {
    pub message: String,
    #[schema(value_type = String)]
    pub company_id: CompanyId,
}

/// Self-service signup. The company starts pending approval with a trial
/// subscription so that approval alone is enough to log in.
pub async fn register_company(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    FormBody(form): FormBody<RegisterCompanyForm>,
) -> Result<(StatusCode, Json<RegistrationResponse>), AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;

    let form = form.normalized();
    form.validate()?;

    if state.companies.email_exists(&form.email).await? {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let password_hash = hash_password(&form.password)?;
    let subscription_end = state
        .clock
        .today()
        .checked_add_days(Days::new(u64::from(state.config.trial_subscription_days)));

    let company = insert_company(
        state.companies.as_ref(),
        &NewCompany {
            name: form.company_name,
            manager_name: form.manager_name,
            email: form.email,
            password_hash,
            phone: form.phone,
            industry: form.industry,
            location: form.location,
            description: form.description,
            subscription_end,
        },
    )
    .await?;

    tracing::info!(company_id = %company.id, "company registered, pending approval");

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            message: "Registration successful. Please wait for admin approval.".to_string(),
            company_id: company.id,
        }),
    ))
}

/// A concurrent signup can claim the email between the existence check and
/// the insert; the unique index decides.
async fn insert_company(
    companies: &dyn CompanyRepository,
    company: &NewCompany,
) -> Result<Company, AppError> {
    companies.create(company).await.map_err(|err| {
        if is_unique_violation(&err) {
            tracing::info!("registration lost a race for an existing email");
            AppError::Conflict(EMAIL_TAKEN.to_string())
        } else {
            err.into()
        }
    })
}
