//! Companies, their registration payloads, and the admin/public views of them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    models::session::CompanyIdentity,
    types::CompanyId,
    utils::time::subscription_days_left,
    validation::rules,
};

#[derive(Debug, Clone, FromRow)]
/// Database representation of a company and its manager's credentials.
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub manager_name: String,
    pub email: String,
    /// Argon2 PHC string for the manager's password.
    pub password_hash: String,
    pub phone: String,
    pub industry: String,
    pub location: String,
    pub description: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    pub is_featured: bool,
    /// Last day the subscription covers. `None` means never subscribed.
    pub subscription_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn identity(&self) -> CompanyIdentity {
        CompanyIdentity {
            id: self.id,
            name: self.name.clone(),
            manager_name: self.manager_name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn status(&self) -> CompanyStatus {
        if !self.is_approved {
            CompanyStatus::Pending
        } else if self.is_active {
            CompanyStatus::Active
        } else {
            CompanyStatus::Inactive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Moderation status shown to administrators.
pub enum CompanyStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
/// Self-service registration form. Companies start pending approval.
pub struct RegisterCompanyForm {
    #[validate(custom(function = "rules::validate_required", message = "Company name is required"))]
    pub company_name: String,
    #[validate(custom(function = "rules::validate_required", message = "Manager name is required"))]
    pub manager_name: String,
    #[validate(email(message = "Valid email address is required"))]
    pub email: String,
    #[validate(custom(function = "rules::validate_password"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    #[validate(custom(function = "rules::validate_required", message = "Phone number is required"))]
    pub phone: String,
    #[validate(custom(function = "rules::validate_required", message = "Industry is required"))]
    pub industry: String,
    #[validate(custom(function = "rules::validate_required", message = "Location is required"))]
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
}

impl RegisterCompanyForm {
    /// Trims free-text fields and lowercases the email address.
    pub fn normalized(mut self) -> Self {
        self.company_name = self.company_name.trim().to_string();
        self.manager_name = self.manager_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.industry = self.industry.trim().to_string();
        self.location = self.location.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}

#[derive(Debug, Clone)]
/// Values inserted for a newly registered company.
pub struct NewCompany {
    pub name: String,
    pub manager_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub industry: String,
    pub location: String,
    pub description: Option<String>,
    pub subscription_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Admin listing filter.
pub enum CompanyListFilter {
    #[default]
    All,
    Pending,
    Active,
    Inactive,
    Featured,
    /// Subscription ends within the next 30 days.
    Expiring,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct CompanyListQuery {
    #[serde(default)]
    pub filter: CompanyListFilter,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct DirectoryQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Row in the admin company listing.
pub struct CompanySummary {
    #[schema(value_type = String)]
    pub id: CompanyId,
    pub name: String,
    pub manager_name: String,
    pub email: String,
    pub phone: String,
    pub industry: String,
    pub location: String,
    pub status: CompanyStatus,
    pub is_featured: bool,
    pub subscription_end: Option<NaiveDate>,
    /// Negative once the subscription has lapsed.
    pub subscription_days_left: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl CompanySummary {
    pub fn from_company(company: Company, today: NaiveDate) -> Self {
        let status = company.status();
        Self {
            id: company.id,
            name: company.name,
            manager_name: company.manager_name,
            email: company.email,
            phone: company.phone,
            industry: company.industry,
            location: company.location,
            status,
            is_featured: company.is_featured,
            subscription_end: company.subscription_end,
            subscription_days_left: subscription_days_left(company.subscription_end, today),
            created_at: company.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Public directory card. Never exposes moderation or credential fields.
pub struct DirectoryEntry {
    #[schema(value_type = String)]
    pub id: CompanyId,
    pub name: String,
    pub industry: String,
    pub location: String,
    pub description: Option<String>,
    pub phone: String,
    pub email: String,
    pub is_featured: bool,
}

impl From<Company> for DirectoryEntry {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            industry: company.industry,
            location: company.location,
            description: company.description,
            phone: company.phone,
            email: company.email,
            is_featured: company.is_featured,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DirectoryFilters {
    pub industries: Vec<String>,
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl PageInfo {
    pub fn new(page: u32, per_page: u32, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total_pages = (total + i64::from(per_page) - 1) / i64::from(per_page);
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// A slice of rows plus the total matching count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One-based page request converted to LIMIT/OFFSET.
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow, ToSchema)]
/// Headline counts for the admin dashboard.
pub struct CompanyStats {
    pub total_companies: i64,
    pub active_companies: i64,
    pub pending_companies: i64,
    pub featured_companies: i64,
    pub expiring_subscriptions: i64,
}
