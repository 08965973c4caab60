//! Session state and the principal identities it can hold.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{AdminId, CompanyId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Which kind of principal a session identity belongs to.
pub enum PrincipalKind {
    Admin,
    Company,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Admin => "admin",
            PrincipalKind::Company => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Administrator identity as stored in the session.
pub struct AdminIdentity {
    #[schema(value_type = String)]
    pub id: AdminId,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
/// Company-manager identity as stored in the session.
pub struct CompanyIdentity {
    #[schema(value_type = String)]
    pub id: CompanyId,
    pub name: String,
    pub manager_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
/// An authenticated identity. A session holds at most one.
pub enum Principal {
    Admin(AdminIdentity),
    Company(CompanyIdentity),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Admin(_) => PrincipalKind::Admin,
            Principal::Company(_) => PrincipalKind::Company,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Server-side state of one browser session.
pub struct SessionState {
    pub id: SessionId,
    pub principal: Option<Principal>,
    pub csrf_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set by logout; the session row is deleted and the cookie cleared.
    pub destroyed: bool,
}

impl SessionState {
    /// A fresh anonymous session that has not been persisted yet. An
    /// expiry past the representable range saturates.
    pub fn new(now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            id: SessionId::new(),
            principal: None,
            csrf_token: None,
            created_at: now,
            expires_at: now
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            destroyed: false,
        }
    }

    pub fn admin(&self) -> Option<&AdminIdentity> {
        match &self.principal {
            Some(Principal::Admin(admin)) => Some(admin),
            _ => None,
        }
    }

    pub fn company(&self) -> Option<&CompanyIdentity> {
        match &self.principal {
            Some(Principal::Company(company)) => Some(company),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }

    /// Whether there is anything worth persisting for a brand-new session.
    pub fn is_empty(&self) -> bool {
        self.principal.is_none() && self.csrf_token.is_none()
    }

    pub fn destroy(&mut self) {
        self.principal = None;
        self.csrf_token = None;
        self.destroyed = true;
    }
}
