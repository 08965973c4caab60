#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::{
        admin::{
            AdminDashboardResponse, CompanyActionResponse, CompanyListResponse,
            ExtendSubscriptionForm,
        },
        auth::{
            CsrfTokenResponse, LoginForm, LoginPageQuery, LoginPageResponse, LoginResponse,
            MeResponse,
        },
        common::{CsrfForm, MessageResponse},
        directory::DirectoryResponse,
        manager::ManagerDashboardResponse,
        registration::RegistrationResponse,
    },
    models::{
        company::{
            CompanyListFilter, CompanyListQuery, CompanyStats, CompanyStatus, CompanySummary,
            DirectoryEntry, DirectoryFilters, DirectoryQuery, PageInfo, RegisterCompanyForm,
        },
        session::{AdminIdentity, CompanyIdentity, Principal, PrincipalKind},
    },
    utils::cookies::SESSION_COOKIE_NAME,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        login_page_doc,
        csrf_doc,
        login_doc,
        logout_doc,
        me_doc,
        register_doc,
        directory_doc,
        directory_filters_doc,
        admin_dashboard_doc,
        admin_list_companies_doc,
        admin_approve_company_doc,
        admin_reject_company_doc,
        admin_toggle_active_doc,
        admin_toggle_featured_doc,
        admin_extend_subscription_doc,
        manager_dashboard_doc
    ),
    components(
        schemas(
            // auth
            LoginForm,
            LoginResponse,
            LoginPageResponse,
            CsrfTokenResponse,
            CsrfForm,
            MeResponse,
            MessageResponse,
            Principal,
            PrincipalKind,
            AdminIdentity,
            CompanyIdentity,
            // companies
            RegisterCompanyForm,
            RegistrationResponse,
            CompanyStatus,
            CompanySummary,
            CompanyListFilter,
            CompanyListQuery,
            CompanyListResponse,
            CompanyActionResponse,
            CompanyStats,
            ExtendSubscriptionForm,
            PageInfo,
            // dashboards
            AdminDashboardResponse,
            ManagerDashboardResponse,
            // directory
            DirectoryQuery,
            DirectoryEntry,
            DirectoryFilters,
            DirectoryResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Login, logout and CSRF tokens"),
        (name = "Registration", description = "Company self-registration"),
        (name = "Directory", description = "Public company directory"),
        (name = "Admin", description = "Company moderation and dashboard"),
        (name = "Manager", description = "Company manager dashboard")
    ),
    security(("SessionCookie" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/login",
    params(LoginPageQuery),
    responses((status = 200, description = "CSRF token and login notice", body = LoginPageResponse)),
    tag = "Auth",
    security(())
)]
fn login_page_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/csrf",
    responses((status = 200, body = CsrfTokenResponse)),
    tag = "Auth",
    security(())
)]
fn csrf_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields or invalid CSRF token"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account pending, deactivated or expired"),
        (status = 429, description = "Too many login attempts")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 200, description = "Session destroyed", body = MessageResponse)),
    tag = "Auth"
)]
fn logout_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "Current principal, if any", body = MeResponse)),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/register",
    request_body(content = RegisterCompanyForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Registered, pending approval", body = RegistrationResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Registration",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    get,
    path = "/api/directory",
    params(DirectoryQuery),
    responses((status = 200, body = DirectoryResponse)),
    tag = "Directory",
    security(())
)]
fn directory_doc() {}

#[utoipa::path(
    get,
    path = "/api/directory/filters",
    responses((status = 200, body = DirectoryFilters)),
    tag = "Directory",
    security(())
)]
fn directory_filters_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, body = AdminDashboardResponse),
        (status = 303, description = "Not an admin session; redirected to login")
    ),
    tag = "Admin"
)]
fn admin_dashboard_doc() {}

#[utoipa::path(
    get,
    path = "/api/admin/companies",
    params(CompanyListQuery),
    responses((status = 200, body = CompanyListResponse)),
    tag = "Admin"
)]
fn admin_list_companies_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/approve",
    params(("id" = String, Path, description = "Company id")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, body = CompanyActionResponse),
        (status = 404, description = "Unknown company")
    ),
    tag = "Admin"
)]
fn admin_approve_company_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/reject",
    params(("id" = String, Path, description = "Company id")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, body = CompanyActionResponse),
        (status = 404, description = "Unknown company")
    ),
    tag = "Admin"
)]
fn admin_reject_company_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/toggle-active",
    params(("id" = String, Path, description = "Company id")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 200, body = CompanyActionResponse)),
    tag = "Admin"
)]
fn admin_toggle_active_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/toggle-featured",
    params(("id" = String, Path, description = "Company id")),
    request_body(content = CsrfForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 200, body = CompanyActionResponse)),
    tag = "Admin"
)]
fn admin_toggle_featured_doc() {}

#[utoipa::path(
    post,
    path = "/api/admin/companies/{id}/extend-subscription",
    params(("id" = String, Path, description = "Company id")),
    request_body(content = ExtendSubscriptionForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, body = CompanyActionResponse),
        (status = 400, description = "Months outside 1..=36")
    ),
    tag = "Admin"
)]
fn admin_extend_subscription_doc() {}

#[utoipa::path(
    get,
    path = "/api/manager/dashboard",
    responses(
        (status = 200, body = ManagerDashboardResponse),
        (status = 303, description = "Not a valid company session; redirected to login")
    ),
    tag = "Manager"
)]
fn manager_dashboard_doc() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/auth/logout",
            "/api/register",
            "/api/directory",
            "/api/admin/companies/{id}/extend-subscription",
            "/api/manager/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
