use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    error::AppError,
    middleware::session::SessionHandle,
    models::session::Principal,
    services::AuthError,
    state::AppState,
};

pub const SUBSCRIPTION_EXPIRED_NOTICE: &str = "subscription_expired";

/// Admin-only routes. Anything but an admin session is sent to the login page.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(handle) = request.extensions().get::<SessionHandle>().cloned() else {
        return login_redirect(&state, None);
    };

    let admin = {
        let session = handle.lock().await;
        state.access.require_admin_session(&session)
    };

    match admin {
        Ok(admin) => {
            request
                .extensions_mut()
                .insert(Principal::Admin(admin.clone()));
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(_) => login_redirect(&state, None),
    }
}

/// Company-only routes. The company is re-validated on every request; a
/// lapsed company loses its session and is told why on the login page.
pub async fn require_company(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(handle) = request.extensions().get::<SessionHandle>().cloned() else {
        return login_redirect(&state, None);
    };

    let company = {
        let mut session = handle.lock().await;
        state.access.require_company_session(&mut session).await
    };

    match company {
        Ok(company) => {
            request
                .extensions_mut()
                .insert(Principal::Company(company.clone()));
            request.extensions_mut().insert(company);
            next.run(request).await
        }
        Err(AuthError::SubscriptionExpired) => {
            login_redirect(&state, Some(SUBSCRIPTION_EXPIRED_NOTICE))
        }
        Err(AuthError::Storage(err)) => AppError::from(err).into_response(),
        Err(_) => login_redirect(&state, None),
    }
}

fn login_redirect(state: &AppState, error: Option<&str>) -> Response {
    let target = match error {
        Some(error) => format!("{}?error={}", state.config.login_path, error),
        None => state.config.login_path.clone(),
    };
    Redirect::to(&target).into_response()
}
