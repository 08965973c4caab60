//! Session-gated access control for administrators and company managers.
//!
//! The controller authenticates principals against stored credentials,
//! writes the resulting identity into the request's [`SessionState`], and
//! re-validates company principals on every protected request.

use std::sync::Arc;

use crate::{
    models::session::{AdminIdentity, CompanyIdentity, Principal, PrincipalKind, SessionState},
    repositories::{AdminRepository, CompanyRepository},
    utils::{
        csrf::{generate_csrf_token, tokens_match},
        password::verify_password,
        time::{is_subscription_valid, Clock},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Your account is pending approval")]
    AccountPendingApproval,
    #[error("Your account has been deactivated")]
    AccountDeactivated,
    #[error("Your subscription has expired")]
    SubscriptionExpired,
    #[error("Invalid request. Please try again.")]
    InvalidCsrfToken,
    #[error("Authentication required")]
    NotAuthenticated,
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::AccountPendingApproval => "ACCOUNT_PENDING_APPROVAL",
            AuthError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthError::SubscriptionExpired => "SUBSCRIPTION_EXPIRED",
            AuthError::InvalidCsrfToken => "INVALID_CSRF_TOKEN",
            AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
            AuthError::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

#[derive(Clone)]
pub struct AccessController {
    admins: Arc<dyn AdminRepository>,
    companies: Arc<dyn CompanyRepository>,
    clock: Arc<dyn Clock>,
}

impl AccessController {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        companies: Arc<dyn CompanyRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            admins,
            companies,
            clock,
        }
    }

    /// Looks the admin up by username or email and verifies the password.
    /// Unknown accounts and wrong passwords are indistinguishable.
    pub async fn authenticate_admin(
        &self,
        session: &mut SessionState,
        identifier: &str,
        password: &str,
    ) -> Result<AdminIdentity, AuthError> {
        let Some(admin) = self.admins.find_by_identifier(identifier).await? else {
            tracing::warn!(gate = "exists", "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !password_matches(password, &admin.password_hash) {
            tracing::warn!(admin_id = %admin.id, gate = "password", "admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = admin.identity();
        session.principal = Some(Principal::Admin(identity.clone()));
        tracing::info!(admin_id = %admin.id, session_id = %session.id, "admin authenticated");
        Ok(identity)
    }

    /// Applies the account gates in order (exists, approved, active,
    /// subscription) before checking the password.
    pub async fn authenticate_company(
        &self,
        session: &mut SessionState,
        email: &str,
        password: &str,
    ) -> Result<CompanyIdentity, AuthError> {
        let Some(company) = self.companies.find_by_email(email).await? else {
            tracing::warn!(gate = "exists", "company login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !company.is_approved {
            tracing::warn!(company_id = %company.id, gate = "approved", "company login rejected");
            return Err(AuthError::AccountPendingApproval);
        }
        if !company.is_active {
            tracing::warn!(company_id = %company.id, gate = "active", "company login rejected");
            return Err(AuthError::AccountDeactivated);
        }
        if !is_subscription_valid(company.subscription_end, self.clock.today()) {
            tracing::warn!(
                company_id = %company.id,
                gate = "subscription",
                subscription_end = ?company.subscription_end,
                "company login rejected"
            );
            return Err(AuthError::SubscriptionExpired);
        }
        if !password_matches(password, &company.password_hash) {
            tracing::warn!(company_id = %company.id, gate = "password", "company login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = company.identity();
        session.principal = Some(Principal::Company(identity.clone()));
        tracing::info!(company_id = %company.id, session_id = %session.id, "company authenticated");
        Ok(identity)
    }

    pub fn require_admin_session(&self, session: &SessionState) -> Result<AdminIdentity, AuthError> {
        session.admin().cloned().ok_or(AuthError::NotAuthenticated)
    }

    /// Re-reads the company behind the session. A company that vanished,
    /// was deactivated or let its subscription lapse loses its identity.
    pub async fn require_company_session(
        &self,
        session: &mut SessionState,
    ) -> Result<CompanyIdentity, AuthError> {
        let Some(current) = session.company() else {
            return Err(AuthError::NotAuthenticated);
        };
        let company_id = current.id;

        let company = self.companies.find_by_id(company_id).await?;
        let today = self.clock.today();
        let company = match company {
            Some(company)
                if company.is_approved
                    && company.is_active
                    && is_subscription_valid(company.subscription_end, today) =>
            {
                company
            }
            _ => {
                tracing::warn!(
                    company_id = %company_id,
                    session_id = %session.id,
                    "company session revoked on re-validation"
                );
                self.end_session(session, PrincipalKind::Company);
                return Err(AuthError::SubscriptionExpired);
            }
        };

        let identity = company.identity();
        if session.company() != Some(&identity) {
            session.principal = Some(Principal::Company(identity.clone()));
        }
        Ok(identity)
    }

    /// Returns the session's CSRF token, minting one on first use.
    pub fn issue_csrf_token(&self, session: &mut SessionState) -> String {
        session
            .csrf_token
            .get_or_insert_with(generate_csrf_token)
            .clone()
    }

    pub fn verify_csrf_token(&self, session: &SessionState, candidate: &str) -> bool {
        match session.csrf_token.as_deref() {
            Some(expected) => tokens_match(expected, candidate),
            None => false,
        }
    }

    /// Clears the identity of `kind` only; the CSRF token survives.
    pub fn end_session(&self, session: &mut SessionState, kind: PrincipalKind) {
        if session.principal.as_ref().map(Principal::kind) == Some(kind) {
            session.principal = None;
            tracing::info!(session_id = %session.id, kind = kind.as_str(), "session identity cleared");
        }
    }
}

fn password_matches(password: &str, hash: &str) -> bool {
    match verify_password(password, hash) {
        Ok(matches) => matches,
        Err(err) => {
            tracing::error!(error = %err, "stored password hash could not be parsed");
            false
        }
    }
}
