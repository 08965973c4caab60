//! Administrator accounts.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::{models::session::AdminIdentity, types::AdminId};

#[derive(Debug, Clone, FromRow)]
/// Database representation of an administrator. Admins are seeded, never
/// self-registered.
pub struct Admin {
    pub id: AdminId,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(username: String, email: String, password_hash: String, full_name: String) -> Self {
        Self {
            id: AdminId::new(),
            username,
            email,
            password_hash,
            full_name,
            created_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> AdminIdentity {
        AdminIdentity {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
        }
    }
}
