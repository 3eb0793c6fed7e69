//! # Database Probe
//!
//! The gateway owns no tables. A Postgres pool exists only so that
//! `GET /user-management/db-test` can prove the configured database answers.
//! The pool connects lazily: a down database never blocks startup.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Resolve the database URL from `DATABASE_URL`, or from the
/// `DB_HOST`/`DB_NAME`/`DB_USERNAME`/`DB_PASSWORD` parts.
///
/// Returns `None` when neither form is configured.
pub fn database_url_from_env() -> Option<String> {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Some(url);
        }
    }
    let host = std::env::var("DB_HOST").ok()?;
    let user = std::env::var("DB_USERNAME").ok()?;
    let password = std::env::var("DB_PASSWORD").unwrap_or_default();
    let name = std::env::var("DB_NAME").unwrap_or_else(|_| "postgres".to_string());
    Some(compose_url(&host, &name, &user, &password))
}

fn compose_url(host: &str, name: &str, user: &str, password: &str) -> String {
    if password.is_empty() {
        format!("postgres://{user}@{host}/{name}")
    } else {
        format!("postgres://{user}:{password}@{host}/{name}")
    }
}

/// Build the probe pool.
///
/// Returns `None` if no database is configured. Returns `Err` only if the
/// URL itself cannot be parsed.
pub fn init_pool(url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = url else {
        tracing::warn!("no database configured, db-test will return 503");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(url)?;

    tracing::info!("database probe pool configured");
    Ok(Some(pool))
}

/// Run `SELECT 1`.
pub async fn probe(pool: &PgPool) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
}
