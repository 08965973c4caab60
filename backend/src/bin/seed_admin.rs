//! Creates an administrator account.
//!
//! Usage: `seed_admin <username> <email> [full name]`, with the password read
//! from `SEED_ADMIN_PASSWORD`. Arguments fall back to `SEED_ADMIN_USERNAME`,
//! `SEED_ADMIN_EMAIL` and `SEED_ADMIN_FULL_NAME`.

use std::env;

use anyhow::{anyhow, Context};
use localbizhub_backend::{
    config::Config,
    db::connection::create_pool,
    models::admin::Admin,
    repositories::{AdminRepository, PgAdminRepository},
    utils::password::hash_password,
    validation::rules::MIN_PASSWORD_LENGTH,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn arg_or_env(args: &[String], index: usize, key: &str) -> Option<String> {
    args.get(index)
        .cloned()
        .or_else(|| env::var(key).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed_admin=info,localbizhub_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let args: Vec<String> = env::args().skip(1).collect();

    let username = arg_or_env(&args, 0, "SEED_ADMIN_USERNAME")
        .ok_or_else(|| anyhow!("admin username is required"))?;
    let email = arg_or_env(&args, 1, "SEED_ADMIN_EMAIL")
        .ok_or_else(|| anyhow!("admin email is required"))?;
    let full_name =
        arg_or_env(&args, 2, "SEED_ADMIN_FULL_NAME").unwrap_or_else(|| username.clone());
    let password = env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(anyhow!(
            "SEED_ADMIN_PASSWORD must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let admins = PgAdminRepository::new(pool);

    if admins.find_by_identifier(&username).await?.is_some()
        || admins.find_by_identifier(&email).await?.is_some()
    {
        return Err(anyhow!("an admin with that username or email already exists"));
    }

    let admin = Admin::new(username, email, hash_password(&password)?, full_name);
    admins.create(&admin).await?;
    tracing::info!(admin_id = %admin.id, username = %admin.username, "admin account created");

    Ok(())
}
