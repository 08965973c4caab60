use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Form,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, middleware::SessionHandle, services::AuthError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `Form` whose rejection is reported through [`AppError`], keeping the
/// JSON error shape for malformed submissions.
#[derive(Debug)]
pub struct FormBody<T>(pub T);

impl<T, S> FromRequest<S> for FormBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query` counterpart of [`FormBody`].
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Body of state-changing forms that carry nothing but the CSRF token.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Rejects the submission unless `candidate` matches the session's token.
pub async fn verify_csrf(
    state: &AppState,
    session: &SessionHandle,
    candidate: &str,
) -> Result<(), AppError> {
    let session = session.lock().await;
    if state.access.verify_csrf_token(&session, candidate) {
        Ok(())
    } else {
        tracing::warn!(session_id = %session.id, "csrf token rejected");
        Err(AuthError::InvalidCsrfToken.into())
    }
}
