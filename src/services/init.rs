//! Initialization helpers for the application:
//! - database connection + migrations
//! - the country message service and its geolocation backend

use std::{path::Path, sync::Arc};

use anyhow::Result;

use crate::config::Config;
use crate::services::country_message::CountryMessageService;
use crate::services::geolocation::GazeCountryResolver;

/// Redact potentially sensitive information from a database URL before logging.
///
/// Attempts to parse the URL and remove userinfo (username:password) components.
/// Falls back to removing everything before '@' or returning "(redacted)".
pub fn redact_db_url(db_url: &str) -> String {
    if let Ok(url) = url::Url::parse(db_url) {
        let scheme = url.scheme();
        let host = url.host_str().unwrap_or("");
        let port_part = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
        let path = url.path();
        format!("{}://{}{}{}", scheme, host, port_part, path)
    } else if let Some(at_pos) = db_url.find('@') {
        format!("(redacted){}", &db_url[at_pos + 1..])
    } else {
        "(redacted)".to_string()
    }
}

/// Initialize SQLite database connection and run migrations.
///
/// Creates the parent directory for the database file (if applicable),
/// opens a connection pool using `create_if_missing(true)` and runs migrations.
pub async fn init_db(config: &Config) -> Result<sqlx::SqlitePool> {
    let db_url = &config.database.url;
    tracing::info!("Connecting to database: {}", redact_db_url(db_url));

    let db_path = db_url.strip_prefix("sqlite://").unwrap_or(db_url);
    let db_file_path = Path::new(db_path);

    if let Some(parent) = db_file_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    let connect_options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(connect_options)
        .await?;

    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Build the country message service backed by the configured gaze service.
pub fn init_country_messages(config: &Config) -> Result<CountryMessageService> {
    if config.geolocation.gaze_url.is_empty() {
        tracing::warn!("GAZE_URL is not set; visitor countries will not be looked up");
    } else {
        tracing::info!(
            "Using gaze service at {} (timeout {}s)",
            config.geolocation.gaze_url,
            config.geolocation.timeout_seconds
        );
    }

    let resolver = GazeCountryResolver::new(&config.geolocation)?;
    let service = CountryMessageService::new(&config.country, Arc::new(resolver))?;

    tracing::info!(
        "Deployment country is {}",
        service.deployment_country().as_str()
    );

    Ok(service)
}
