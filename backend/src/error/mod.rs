use axum::{
    extract::rejection::{FormRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::services::access::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Conflict(String),
    BadRequest(String),
    InternalServerError(anyhow::Error),
    Validation(Vec<String>),
    /// Access-control failure with its own stable code.
    Auth(AuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::InternalServerError(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::Auth(AuthError::Storage(err)) => {
                return AppError::InternalServerError(err.into()).into_response();
            }
            AppError::Auth(err) => (auth_status(&err), err.to_string(), err.code().to_string(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        AuthError::AccountPendingApproval
        | AuthError::AccountDeactivated
        | AuthError::SubscriptionExpired => StatusCode::FORBIDDEN,
        AuthError::InvalidCsrfToken => StatusCode::BAD_REQUEST,
        AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalServerError(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::InternalServerError(err.into()),
        }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "form rejected");
        AppError::BadRequest(format!("Invalid form submission: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn plain_errors_carry_message_and_code() {
        let cases = [
            (
                AppError::BadRequest("Please fill in all fields.".to_string()),
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
            ),
            (
                AppError::Conflict("Email already registered".to_string()),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::NotFound("Company not found".to_string()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
        ];
        for (error, status, code) in cases {
            let message = match &error {
                AppError::BadRequest(m) | AppError::Conflict(m) | AppError::NotFound(m) => m.clone(),
                _ => unreachable!(),
            };
            let response = error.into_response();
            assert_eq!(response.status(), status);
            let body = response_json(response).await;
            assert_eq!(body["error"], message);
            assert_eq!(body["code"], code);
            assert!(body.get("details").is_none());
        }
    }

    #[test]
    fn missing_rows_become_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(sqlx::Error::PoolClosed),
            AppError::InternalServerError(_)
        ));
    }

    #[tokio::test]
    async fn auth_errors_keep_their_message_and_code() {
        let response = AppError::from(AuthError::AccountPendingApproval).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Your account is pending approval");
        assert_eq!(json["code"], "ACCOUNT_PENDING_APPROVAL");

        let response = AppError::from(AuthError::InvalidCsrfToken).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Invalid request. Please try again.");

        let response = AppError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn storage_failures_are_generic() {
        let response =
            AppError::from(AuthError::Storage(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn validation_messages_are_listed_in_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut mismatch = validator::ValidationError::new("must_match");
        mismatch.message = Some("Passwords do not match".into());
        errors.add("confirm_password", mismatch);
        errors.add("phone", validator::ValidationError::new("required"));

        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = response_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["details"]["errors"][0], "Passwords do not match");
        assert_eq!(body["details"]["errors"][1], "phone: required");
    }
}
