use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

use crate::utils::cookies::SameSite;

pub const DEFAULT_SESSION_SECRET: &str = "your-secret-key-change-this-in-production";

/// Upper bound for `SESSION_LIFETIME_HOURS` (one year).
pub const MAX_SESSION_LIFETIME_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_secret: String,
    pub session_lifetime_hours: u64,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub cors_allow_origins: Vec<String>,
    pub time_zone: Tz,
    /// Where unauthenticated or torn-down sessions are sent.
    pub login_path: String,
    pub trial_subscription_days: u32,
    pub records_per_page: u32,
    pub directory_page_size: u32,
    /// Zero disables the login rate limiter.
    pub login_rate_limit_per_minute: u32,
    pub production_mode: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/localbiz_hub".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let session_secret =
            env::var("SESSION_SECRET").unwrap_or_else(|_| DEFAULT_SESSION_SECRET.to_string());

        let session_lifetime_hours = parse_env("SESSION_LIFETIME_HOURS", 24);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cookie_same_site = match env::var("COOKIE_SAMESITE") {
            Ok(value) => value.parse::<SameSite>()?,
            Err(_) => SameSite::Lax,
        };

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:8000".to_string()]);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let login_path = env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string());

        let production_mode = env::var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let config = Config {
            database_url,
            bind_addr,
            session_secret,
            session_lifetime_hours,
            cookie_secure,
            cookie_same_site,
            cors_allow_origins,
            time_zone,
            login_path,
            trial_subscription_days: parse_env("TRIAL_SUBSCRIPTION_DAYS", 30),
            records_per_page: parse_env("RECORDS_PER_PAGE", 10),
            directory_page_size: parse_env("DIRECTORY_PAGE_SIZE", 12),
            login_rate_limit_per_minute: parse_env("LOGIN_RATE_LIMIT_PER_MINUTE", 10),
            production_mode,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.production_mode && self.session_secret == DEFAULT_SESSION_SECRET {
            return Err(anyhow!("SESSION_SECRET must be set in production"));
        }
        if self.session_secret.len() < 32 && self.production_mode {
            return Err(anyhow!("SESSION_SECRET must be at least 32 bytes in production"));
        }
        if !(1..=MAX_SESSION_LIFETIME_HOURS).contains(&self.session_lifetime_hours) {
            return Err(anyhow!(
                "SESSION_LIFETIME_HOURS must be between 1 and {}",
                MAX_SESSION_LIFETIME_HOURS
            ));
        }
        if self.records_per_page == 0 || self.directory_page_size == 0 {
            return Err(anyhow!("Page sizes must be greater than zero"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
