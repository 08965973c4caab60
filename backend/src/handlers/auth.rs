use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppError,
    handlers::common::{verify_csrf, CsrfForm, FormBody, MessageResponse, QueryParams},
    middleware::{auth::SUBSCRIPTION_EXPIRED_NOTICE, SessionHandle},
    models::session::{Principal, PrincipalKind},
    services::AuthError,
    state::AppState,
};

pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";
pub const MANAGER_DASHBOARD_PATH: &str = "/manager/dashboard";

const SUBSCRIPTION_EXPIRED_MESSAGE: &str =
    "Your subscription has expired. Please contact admin to renew.";

#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginPageQuery {
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginPageResponse {
    pub csrf_token: String,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub email_username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_user_type")]
    pub user_type: PrincipalKind,
    #[serde(default)]
    pub csrf_token: String,
}

fn default_user_type() -> PrincipalKind {
    PrincipalKind::Company
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub principal: Principal,
    pub redirect_to: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub principal: Option<Principal>,
}

pub async fn login_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    QueryParams(query): QueryParams<LoginPageQuery>,
) -> Json<LoginPageResponse> {
    let mut session = session.lock().await;
    let csrf_token = state.access.issue_csrf_token(&mut session);
    let notice = match query.error.as_deref() {
        Some(SUBSCRIPTION_EXPIRED_NOTICE) => Some(SUBSCRIPTION_EXPIRED_MESSAGE.to_string()),
        _ => None,
    };
    Json(LoginPageResponse { csrf_token, notice })
}

pub async fn csrf_token(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
) -> Json<CsrfTokenResponse> {
    let mut session = session.lock().await;
    Json(CsrfTokenResponse {
        csrf_token: state.access.issue_csrf_token(&mut session),
    })
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Json<LoginResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;

    let identifier = form.email_username.trim();
    if identifier.is_empty() || form.password.is_empty() {
        return Err(AppError::BadRequest("Please fill in all fields.".to_string()));
    }

    let mut session = session.lock().await;
    let response = match form.user_type {
        PrincipalKind::Admin => {
            let admin = state
                .access
                .authenticate_admin(&mut session, identifier, &form.password)
                .await
                .map_err(|err| match err {
                    AuthError::InvalidCredentials => AppError::Unauthorized(
                        "Invalid username/email or password.".to_string(),
                    ),
                    other => other.into(),
                })?;
            LoginResponse {
                principal: Principal::Admin(admin),
                redirect_to: ADMIN_DASHBOARD_PATH.to_string(),
            }
        }
        PrincipalKind::Company => {
            let company = state
                .access
                .authenticate_company(&mut session, identifier, &form.password)
                .await?;
            LoginResponse {
                principal: Principal::Company(company),
                redirect_to: MANAGER_DASHBOARD_PATH.to_string(),
            }
        }
    };

    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionHandle>,
    FormBody(form): FormBody<CsrfForm>,
) -> Result<Json<MessageResponse>, AppError> {
    verify_csrf(&state, &session, &form.csrf_token).await?;

    let mut session = session.lock().await;
    if let Some(kind) = session.principal.as_ref().map(Principal::kind) {
        state.access.end_session(&mut session, kind);
    }
    session.destroy();

    Ok(Json(MessageResponse::new(
        "You have been logged out successfully.",
    )))
}

pub async fn me(Extension(session): Extension<SessionHandle>) -> Json<MeResponse> {
    let session = session.lock().await;
    Json(MeResponse {
        principal: session.principal.clone(),
    })
}
