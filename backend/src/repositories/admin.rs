//! Administrator lookups.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::admin::Admin;

const ADMIN_COLUMNS: &str = "id, username, email, password_hash, full_name, created_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Matches either the username or the email address, ignoring case.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Admin>, sqlx::Error>;

    async fn create(&self, admin: &Admin) -> Result<(), sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Admin>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM admins \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) LIMIT 1",
            ADMIN_COLUMNS
        );
        sqlx::query_as::<_, Admin>(&query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create(&self, admin: &Admin) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO admins (id, username, email, password_hash, full_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(admin.id)
        .bind(&admin.username)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(&admin.full_name)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
    }
}
