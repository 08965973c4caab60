use std::sync::Arc;

use chrono::TimeDelta;

use crate::{
    config::{Config, MAX_SESSION_LIFETIME_HOURS},
    db::connection::DbPool,
    repositories::{
        AdminRepository, CompanyRepository, PgAdminRepository, PgCompanyRepository,
        PgSessionRepository, SessionRepository,
    },
    services::AccessController,
    utils::{
        cookies::CookieOptions,
        time::{Clock, SystemClock},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub admins: Arc<dyn AdminRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub clock: Arc<dyn Clock>,
    pub access: AccessController,
}

impl AppState {
    pub fn new(
        config: Config,
        admins: Arc<dyn AdminRepository>,
        companies: Arc<dyn CompanyRepository>,
        sessions: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let access = AccessController::new(admins.clone(), companies.clone(), clock.clone());
        Self {
            config,
            admins,
            companies,
            sessions,
            clock,
            access,
        }
    }

    /// Wires the PostgreSQL repositories and the wall clock.
    pub fn from_pool(pool: DbPool, config: Config) -> Self {
        let clock = Arc::new(SystemClock::new(config.time_zone));
        Self::new(
            config,
            Arc::new(PgAdminRepository::new(pool.clone())),
            Arc::new(PgCompanyRepository::new(pool.clone())),
            Arc::new(PgSessionRepository::new(pool)),
            clock,
        )
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.config.cookie_secure,
            same_site: self.config.cookie_same_site,
        }
    }

    /// Falls back to the one-year cap when the configured value is out of
    /// range, so a config that skipped `validate` cannot overflow.
    pub fn session_lifetime(&self) -> TimeDelta {
        let hours = self
            .config
            .session_lifetime_hours
            .clamp(1, MAX_SESSION_LIFETIME_HOURS);
        i64::try_from(hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::days(366))
    }
}
