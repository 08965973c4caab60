#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use localbizhub_backend::{
    app,
    config::Config,
    models::{
        admin::Admin,
        company::{
            Company, CompanyListFilter, CompanyStats, DirectoryFilters, NewCompany, Page,
            Pagination,
        },
        session::SessionState,
    },
    repositories::{
        company::expiring_until, AdminRepository, CompanyListCriteria, CompanyRepository,
        DirectoryCriteria, SessionRepository,
    },
    state::AppState,
    types::{CompanyId, SessionId},
    utils::{
        cookies::{SameSite, SESSION_COOKIE_NAME},
        password::hash_password,
        time::{extended_subscription_end, Clock, ManualClock},
    },
};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_SESSION_SECRET: &str = "integration-test-session-secret-0123456789";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/unused".into(),
        bind_addr: "127.0.0.1:0".into(),
        session_secret: TEST_SESSION_SECRET.into(),
        session_lifetime_hours: 24,
        cookie_secure: false,
        cookie_same_site: SameSite::Lax,
        cors_allow_origins: vec!["http://localhost:8000".into()],
        time_zone: chrono_tz::UTC,
        login_path: "/login".into(),
        trial_subscription_days: 30,
        records_per_page: 10,
        directory_page_size: 12,
        login_rate_limit_per_minute: 0,
        production_mode: false,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct InMemoryAdmins {
    admins: Mutex<Vec<Admin>>,
}

#[async_trait]
impl AdminRepository for InMemoryAdmins {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Admin>, sqlx::Error> {
        Ok(lock(&self.admins)
            .iter()
            .find(|admin| {
                admin.username.eq_ignore_ascii_case(identifier)
                    || admin.email.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn create(&self, admin: &Admin) -> Result<(), sqlx::Error> {
        lock(&self.admins).push(admin.clone());
        Ok(())
    }
}

pub struct InMemoryCompanies {
    companies: Mutex<Vec<Company>>,
    clock: Arc<ManualClock>,
}

impl InMemoryCompanies {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            companies: Mutex::new(Vec::new()),
            clock,
        }
    }

    pub fn insert(&self, company: Company) {
        lock(&self.companies).push(company);
    }

    pub fn get(&self, id: CompanyId) -> Option<Company> {
        lock(&self.companies).iter().find(|c| c.id == id).cloned()
    }

    pub fn get_by_email(&self, email: &str) -> Option<Company> {
        lock(&self.companies)
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub fn update(&self, id: CompanyId, f: impl FnOnce(&mut Company)) {
        if let Some(company) = lock(&self.companies).iter_mut().find(|c| c.id == id) {
            f(company);
        }
    }

    fn modify<T>(&self, id: CompanyId, f: impl FnOnce(&mut Company) -> T) -> Option<T> {
        let now = self.clock.now_utc();
        lock(&self.companies)
            .iter_mut()
            .find(|c| c.id == id)
            .map(|company| {
                let result = f(company);
                company.updated_at = now;
                result
            })
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn search(term: &Option<String>) -> Option<String> {
    term.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn paginate(mut items: Vec<Company>, pagination: Pagination) -> Page<Company> {
    let total = items.len() as i64;
    let offset = pagination.offset() as usize;
    let limit = pagination.limit() as usize;
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items.drain(offset..).take(limit).collect()
    };
    Page { items, total }
}

fn is_listed(company: &Company) -> bool {
    company.is_approved && company.is_active
}

#[async_trait]
impl CompanyRepository for InMemoryCompanies {
    async fn find_by_email(&self, email: &str) -> Result<Option<Company>, sqlx::Error> {
        Ok(lock(&self.companies)
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: CompanyId) -> Result<Option<Company>, sqlx::Error> {
        Ok(self.get(id))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, sqlx::Error> {
        Ok(lock(&self.companies).iter().any(|c| c.email.eq_ignore_ascii_case(email)))
    }

    async fn create(&self, new: &NewCompany) -> Result<Company, sqlx::Error> {
        let now = self.clock.now_utc();
        let company = Company {
            id: CompanyId::new(),
            name: new.name.clone(),
            manager_name: new.manager_name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            phone: new.phone.clone(),
            industry: new.industry.clone(),
            location: new.location.clone(),
            description: new.description.clone(),
            is_approved: false,
            is_active: false,
            is_featured: false,
            subscription_end: new.subscription_end,
            created_at: now,
            updated_at: now,
        };
        self.insert(company.clone());
        Ok(company)
    }

    async fn set_approval(&self, id: CompanyId, approved: bool) -> Result<bool, sqlx::Error> {
        Ok(self
            .modify(id, |c| {
                c.is_approved = approved;
                c.is_active = approved;
            })
            .is_some())
    }

    async fn toggle_active(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error> {
        Ok(self.modify(id, |c| {
            c.is_active = !c.is_active;
            c.is_active
        }))
    }

    async fn toggle_featured(&self, id: CompanyId) -> Result<Option<bool>, sqlx::Error> {
        Ok(self.modify(id, |c| {
            c.is_featured = !c.is_featured;
            c.is_featured
        }))
    }

    async fn extend_subscription(
        &self,
        id: CompanyId,
        months: u32,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, sqlx::Error> {
        Ok(self
            .modify(id, |c| {
                c.subscription_end = extended_subscription_end(
                    c.subscription_end,
                    today,
                    months,
                );
                c.subscription_end
            })
            .flatten())
    }

    async fn list(&self, criteria: &CompanyListCriteria) -> Result<Page<Company>, sqlx::Error> {
        let until = expiring_until(criteria.today);
        let term = search(&criteria.search);
        let mut items: Vec<Company> = lock(&self.companies)
            .iter()
            .filter(|c| match criteria.filter {
                CompanyListFilter::All => true,
                CompanyListFilter::Pending => !c.is_approved,
                CompanyListFilter::Active => c.is_approved && c.is_active,
                CompanyListFilter::Inactive => !c.is_active,
                CompanyListFilter::Featured => c.is_featured,
                CompanyListFilter::Expiring => c
                    .subscription_end
                    .is_some_and(|end| end >= criteria.today && end <= until),
            })
            .filter(|c| match &term {
                Some(t) => {
                    contains(&c.name, t)
                        || contains(&c.manager_name, t)
                        || contains(&c.email, t)
                        || contains(&c.industry, t)
                }
                None => true,
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(items, criteria.pagination))
    }

    async fn stats(&self, today: NaiveDate) -> Result<CompanyStats, sqlx::Error> {
        let until = expiring_until(today);
        let companies = lock(&self.companies);
        let count = |f: &dyn Fn(&Company) -> bool| companies.iter().filter(|c| f(c)).count() as i64;
        Ok(CompanyStats {
            total_companies: companies.len() as i64,
            active_companies: count(&|c: &Company| c.is_approved && c.is_active),
            pending_companies: count(&|c: &Company| !c.is_approved),
            featured_companies: count(&|c: &Company| c.is_featured && c.is_active),
            expiring_subscriptions: count(&|c: &Company| {
                c.subscription_end
                    .is_some_and(|end| end >= today && end <= until)
            }),
        })
    }

    async fn recent_registrations(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error> {
        let mut items: Vec<Company> = lock(&self.companies)
            .iter()
            .filter(|c| c.created_at >= since)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn expiring_subscriptions(
        &self,
        today: NaiveDate,
        until: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Company>, sqlx::Error> {
        let mut items: Vec<Company> = lock(&self.companies)
            .iter()
            .filter(|c| {
                c.is_active
                    && c.subscription_end
                        .is_some_and(|end| end >= today && end <= until)
            })
            .cloned()
            .collect();
        items.sort_by_key(|c| c.subscription_end);
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn directory(&self, criteria: &DirectoryCriteria) -> Result<Page<Company>, sqlx::Error> {
        let term = search(&criteria.search);
        let industry = search(&criteria.industry);
        let location = search(&criteria.location);
        let mut items: Vec<Company> = lock(&self.companies)
            .iter()
            .filter(|c| is_listed(c))
            .filter(|c| match &term {
                Some(t) => {
                    contains(&c.name, t)
                        || c.description.as_deref().is_some_and(|d| contains(d, t))
                }
                None => true,
            })
            .filter(|c| industry.as_ref().map_or(true, |i| &c.industry == i))
            .filter(|c| location.as_ref().map_or(true, |l| contains(&c.location, l)))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.is_featured
                .cmp(&a.is_featured)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(paginate(items, criteria.pagination))
    }

    async fn directory_filters(&self) -> Result<DirectoryFilters, sqlx::Error> {
        let companies = lock(&self.companies);
        let mut industries: Vec<String> = companies
            .iter()
            .filter(|c| is_listed(c))
            .map(|c| c.industry.clone())
            .collect();
        let mut locations: Vec<String> = companies
            .iter()
            .filter(|c| is_listed(c))
            .map(|c| c.location.clone())
            .collect();
        industries.sort();
        industries.dedup();
        locations.sort();
        locations.dedup();
        Ok(DirectoryFilters {
            industries,
            locations,
        })
    }
}

#[derive(Default)]
pub struct InMemorySessions {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl InMemorySessions {
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn get(&self, id: SessionId) -> Option<SessionState> {
        lock(&self.sessions).get(&id).cloned()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessions {
    async fn find(
        &self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionState>, sqlx::Error> {
        Ok(lock(&self.sessions)
            .get(&id)
            .filter(|s| s.expires_at > now)
            .cloned())
    }

    async fn save(&self, session: &SessionState) -> Result<(), sqlx::Error> {
        lock(&self.sessions).insert(session.id, session.clone());
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), sqlx::Error> {
        lock(&self.sessions).remove(&id);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

pub struct CompanySeed {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub industry: &'static str,
    pub location: &'static str,
    pub description: Option<&'static str>,
    pub is_approved: bool,
    pub is_active: bool,
    pub is_featured: bool,
    pub subscription_end: Option<NaiveDate>,
}

impl CompanySeed {
    pub fn approved(name: &'static str, email: &'static str, subscription_end: NaiveDate) -> Self {
        Self {
            name,
            email,
            password: "secret1",
            industry: "Retail",
            location: "Springfield",
            description: None,
            is_approved: true,
            is_active: true,
            is_featured: false,
            subscription_end: Some(subscription_end),
        }
    }

    pub fn pending(name: &'static str, email: &'static str) -> Self {
        Self {
            is_approved: false,
            is_active: false,
            subscription_end: None,
            ..Self::approved(name, email, date(2000, 1, 1))
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub admins: Arc<InMemoryAdmins>,
    pub companies: Arc<InMemoryCompanies>,
    pub sessions: Arc<InMemorySessions>,
}

impl TestApp {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_config(today, test_config())
    }

    pub fn with_config(today: NaiveDate, config: Config) -> Self {
        let clock = Arc::new(ManualClock::on_date(today));
        let admins = Arc::new(InMemoryAdmins::default());
        let companies = Arc::new(InMemoryCompanies::new(clock.clone()));
        let sessions = Arc::new(InMemorySessions::default());
        let state = AppState::new(
            config,
            admins.clone(),
            companies.clone(),
            sessions.clone(),
            clock.clone(),
        );
        let router = app::router(state.clone()).expect("build router");
        Self {
            router,
            state,
            clock,
            admins,
            companies,
            sessions,
        }
    }

    pub fn seed_admin(&self, username: &str, email: &str, password: &str) -> Admin {
        let admin = Admin::new(
            username.into(),
            email.into(),
            hash_password(password).expect("hash password"),
            "Site Admin".into(),
        );
        lock(&self.admins.admins).push(admin.clone());
        admin
    }

    pub fn seed_company(&self, seed: CompanySeed) -> Company {
        let now = self.clock.now_utc();
        let company = Company {
            id: CompanyId::new(),
            name: seed.name.into(),
            manager_name: format!("{} Manager", seed.name),
            email: seed.email.into(),
            password_hash: hash_password(seed.password).expect("hash password"),
            phone: "555-0100".into(),
            industry: seed.industry.into(),
            location: seed.location.into(),
            description: seed.description.map(str::to_string),
            is_approved: seed.is_approved,
            is_active: seed.is_active,
            is_featured: seed.is_featured,
            subscription_end: seed.subscription_end,
            created_at: now,
            updated_at: now,
        };
        self.companies.insert(company.clone());
        company
    }

    pub fn advance_days(&self, days: u64) {
        let today = self.clock.today();
        self.clock
            .set_date(today.checked_add_days(Days::new(days)).expect("date in range"));
    }

    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Browser-like client that keeps the session cookie between requests.
pub struct TestClient {
    router: Router,
    pub cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form_body(fields)))
            .unwrap();
        self.send(request).await
    }

    pub async fn csrf_token(&mut self) -> String {
        let response = self.get("/api/auth/csrf").await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["csrf_token"]
            .as_str()
            .expect("csrf token")
            .to_string()
    }

    pub async fn login(&mut self, user_type: &str, identifier: &str, password: &str) -> TestResponse {
        let csrf = self.csrf_token().await;
        self.post_form(
            "/api/auth/login",
            &[
                ("email_username", identifier),
                ("password", password),
                ("user_type", user_type),
                ("csrf_token", csrf.as_str()),
            ],
        )
        .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE_NAME, cookie));
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("call router");
        let status = response.status();
        let headers = response.headers().clone();

        let prefix = format!("{}=", SESSION_COOKIE_NAME);
        for value in headers.get_all(header::SET_COOKIE) {
            let Some(value) = value.to_str().ok() else {
                continue;
            };
            if let Some(rest) = value.strip_prefix(&prefix) {
                let token = rest.split(';').next().unwrap_or_default().trim();
                self.cookie = (!token.is_empty()).then(|| token.to_string());
            }
        }

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
