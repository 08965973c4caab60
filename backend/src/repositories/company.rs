//! Company persistence: registration, moderation, listings and the public
//! directory.

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    models::company::{
        Company, CompanyListFilter, CompanyStats, DirectoryFilters, NewCompany, Page, Pagination,
    },
    repositories::common::{contains_pattern, push_clause, search_term},
    types::CompanyId,
};

const COMPANY_COLUMNS: &str = "id, name, manager_name, email, password_hash, phone, industry, \
     location, description, is_approved, is_active, is_featured, subscription_end, created_at, \
     updated_at";

/// Subscriptions ending within this many days count as expiring.
pub const EXPIRING_WINDOW_DAYS: u64 = 30;

/// Admin listing criteria.
#[derive(Debug, Clone)]
pub struct CompanyListCriteria {
    pub filter: CompanyListFilter,
    pub search: Option<String>,
    pub today: NaiveDate,
    pub pagination: Pagination,
}

/// Public directory criteria. Only approved and active companies are listed.
#[derive(Debug, Clone)]
pub struct DirectoryCriteria {
    pub search: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    pub pagination: Pagination,
}

/// Last day of the expiring window that starts on `today`.
pub fn expiring_until(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(EXPIRING_WINDOW_DAYS))
        .unwrap_or(today)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Email addresses compare case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, sqlx::Error>;

    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, sqlx::Error>;

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error>;

    async fn create(&self, company: &NewCompany) -> Result<Company, sqlx::Error>;

    /// Approval and rejection set both `is_approved` and `is_active`.
    /// Returns false when the company does not exist.
    async fn set_approval(&self, id: CompanyId, approved: bool) -> Result<bool, sqlx::Error>;

    /// Returns the new `is_active` value.
    async fn toggle_active(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error>;

    /// Returns the new `is_featured` value.
    async fn toggle_featured(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error>;

    /// Pushes `subscription_end` out by `months`, starting from `today` when
    /// the subscription has lapsed. Returns the new end date.
    async fn extend_subscription(
        &self,
        id: CompanyId,
        months: u32,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, sqlx::Error>;

    async fn list(&self, criteria: &CompanyListCriteria) -> Result<Page<Company>, sqlx::Error>;

    async fn stats(&self, today: NaiveDate) -> Result<CompanyStats, sqlx::Error>;

    async fn recent_registrations(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error>;

    /// Active companies whose subscription ends between `today` and `until`,
    /// soonest first.
    async fn expiring_subscriptions(
        &self,
        today: NaiveDate,
        until: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error>;

    async fn directory(&self, criteria: &DirectoryCriteria) -> Result<Page<Company>, sqlx::Error>;

    async fn directory_filters(&self) -> Result<DirectoryFilters, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_page(
        &self,
        mut rows: QueryBuilder<'_, Postgres>,
        mut count: QueryBuilder<'_, Postgres>,
        order_by: &str,
        pagination: Pagination,
    ) -> Result<Page<Company>, sqlx::Error> {
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        rows.push(order_by)
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());
        let items = rows.build_query_as::<Company>().fetch_all(&self.pool).await?;

        Ok(Page { items, total })
    }
}

fn apply_list_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    has_clause: &mut bool,
    criteria: &CompanyListCriteria,
) {
    match criteria.filter {
        CompanyListFilter::All => {}
        CompanyListFilter::Pending => {
            push_clause(builder, has_clause);
            builder.push("is_approved = FALSE");
        }
        CompanyListFilter::Active => {
            push_clause(builder, has_clause);
            builder.push("is_approved = TRUE AND is_active = TRUE");
        }
        CompanyListFilter::Inactive => {
            push_clause(builder, has_clause);
            builder.push("is_active = FALSE");
        }
        CompanyListFilter::Featured => {
            push_clause(builder, has_clause);
            builder.push("is_featured = TRUE");
        }
        CompanyListFilter::Expiring => {
            push_clause(builder, has_clause);
            builder
                .push("subscription_end BETWEEN ")
                .push_bind(criteria.today)
                .push(" AND ")
                .push_bind(expiring_until(criteria.today));
        }
    }

    if let Some(term) = search_term(criteria.search.as_deref()) {
        let pattern = contains_pattern(term);
        push_clause(builder, has_clause);
        builder
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR manager_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR industry ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn apply_directory_filters(builder: &mut QueryBuilder<'_, Postgres>, criteria: &DirectoryCriteria) {
    let mut has_clause = false;
    push_clause(builder, &mut has_clause);
    builder.push("is_approved = TRUE AND is_active = TRUE");

    if let Some(term) = search_term(criteria.search.as_deref()) {
        let pattern = contains_pattern(term);
        push_clause(builder, &mut has_clause);
        builder
            .push("(name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(industry) = search_term(criteria.industry.as_deref()) {
        push_clause(builder, &mut has_clause);
        builder.push("industry = ").push_bind(industry.to_string());
    }
    if let Some(location) = search_term(criteria.location.as_deref()) {
        push_clause(builder, &mut has_clause);
        builder
            .push("location ILIKE ")
            .push_bind(contains_pattern(location));
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM companies WHERE LOWER(email) = LOWER($1)",
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, sqlx::Error> {
        let query = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        sqlx::query_as::<_, Company>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
    }

    async fn create(&self, company: &NewCompany) -> Result<Company, sqlx::Error> {
        let query = format!(
            "INSERT INTO companies \
             (id, name, manager_name, email, password_hash, phone, industry, location, \
             description, subscription_end) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(CompanyId::new())
            .bind(&company.name)
            .bind(&company.manager_name)
            .bind(&company.email)
            .bind(&company.password_hash)
            .bind(&company.phone)
            .bind(&company.industry)
            .bind(&company.location)
            .bind(&company.description)
            .bind(company.subscription_end)
            .fetch_one(&self.pool)
            .await
    }

    async fn set_approval(&self, id: CompanyId, approved: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE companies SET is_approved = $2, is_active = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(approved)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn toggle_active(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE companies SET is_active = NOT is_active, updated_at = NOW() \
             WHERE id = $1 RETURNING is_active",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn toggle_featured(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE companies SET is_featured = NOT is_featured, updated_at = NOW() \
             WHERE id = $1 RETURNING is_featured",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn extend_subscription(
        &self,
        id: CompanyId,
        months: u32,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, sqlx::Error> {
        let months = i32::try_from(months).map_err(|err| sqlx::Error::Encode(Box::new(err)))?;
        let end = sqlx::query_scalar::<_, Option<NaiveDate>>(
            "UPDATE companies \
             SET subscription_end = \
                 (GREATEST(COALESCE(subscription_end, $2), $2) + make_interval(months => $3))::date, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING subscription_end",
        )
        .bind(id)
        .bind(today)
        .bind(months)
        .fetch_optional(&self.pool)
        .await?;
        Ok(end.flatten())
    }

    async fn list(&self, criteria: &CompanyListCriteria) -> Result<Page<Company>, sqlx::Error> {
        let mut rows: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM companies", COMPANY_COLUMNS));
        let mut has_clause = false;
        apply_list_filters(&mut rows, &mut has_clause, criteria);

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM companies");
        let mut count_has_clause = false;
        apply_list_filters(&mut count, &mut count_has_clause, criteria);

        self.fetch_page(rows, count, " ORDER BY created_at DESC, id DESC", criteria.pagination)
            .await
    }

    async fn stats(&self, today: NaiveDate) -> Result<CompanyStats, sqlx::Error> {
        sqlx::query_as::<_, CompanyStats>(
            "SELECT \
                 COUNT(*) AS total_companies, \
                 COUNT(*) FILTER (WHERE is_approved AND is_active) AS active_companies, \
                 COUNT(*) FILTER (WHERE NOT is_approved) AS pending_companies, \
                 COUNT(*) FILTER (WHERE is_featured AND is_active) AS featured_companies, \
                 COUNT(*) FILTER (WHERE subscription_end BETWEEN $1 AND $2) \
                     AS expiring_subscriptions \
             FROM companies",
        )
        .bind(today)
        .bind(expiring_until(today))
        .fetch_one(&self.pool)
        .await
    }

    async fn recent_registrations(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM companies WHERE created_at >= $1 \
             ORDER BY created_at DESC LIMIT $2",
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn expiring_subscriptions(
        &self,
        today: NaiveDate,
        until: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM companies \
             WHERE is_active = TRUE AND subscription_end BETWEEN $1 AND $2 \
             ORDER BY subscription_end ASC LIMIT $3",
            COMPANY_COLUMNS
        );
        sqlx::query_as::<_, Company>(&query)
            .bind(today)
            .bind(until)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn directory(&self, criteria: &DirectoryCriteria) -> Result<Page<Company>, sqlx::Error> {
        let mut rows: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM companies", COMPANY_COLUMNS));
        apply_directory_filters(&mut rows, criteria);

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM companies");
        apply_directory_filters(&mut count, criteria);

        self.fetch_page(
            rows,
            count,
            " ORDER BY is_featured DESC, created_at DESC",
            criteria.pagination,
        )
        .await
    }

    async fn directory_filters(&self) -> Result<DirectoryFilters, sqlx::Error> {
        let industries = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT industry FROM companies \
             WHERE is_approved = TRUE AND is_active = TRUE ORDER BY industry",
        )
        .fetch_all(&self.pool)
        .await?;
        let locations = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT location FROM companies \
             WHERE is_approved = TRUE AND is_active = TRUE ORDER BY location",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(DirectoryFilters {
            industries,
            locations,
        })
    }
}
