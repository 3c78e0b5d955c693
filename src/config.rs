use std::env;

use serde::Deserialize;

use crate::services::geolocation::CountryCode;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub country: CountryConfig,
    pub geolocation: GeolocationConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the main site that fetches the country message fragment.
    pub frontend_url: String,
    /// Take the visitor address from `X-Forwarded-For` / `X-Real-IP`. Only
    /// safe behind a reverse proxy that overwrites those headers.
    pub trust_forwarded_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryConfig {
    /// Two-letter, upper-cased code of the country this deployment serves.
    pub iso_country_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeolocationConfig {
    /// Base URL of the gaze service. Empty disables IP lookups entirely.
    pub gaze_url: String,
    /// Upper bound for a single lookup, so a slow service cannot stall the request.
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second (per IP) for the country message endpoint
    pub per_second: u32,
    /// Burst size for the country message endpoint
    pub burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let iso_country_code = env::var("ISO_COUNTRY_CODE")
            .map_err(|_| ConfigError::MissingEnv("ISO_COUNTRY_CODE".to_string()))?;
        let iso_country_code = CountryCode::parse(&iso_country_code)
            .ok_or_else(|| ConfigError::InvalidValue("ISO_COUNTRY_CODE".to_string()))?;

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,
                frontend_url: env::var("FRONTEND_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                trust_forwarded_headers: parse_flag(
                    "TRUST_FORWARDED_HEADERS",
                    &env::var("TRUST_FORWARDED_HEADERS").unwrap_or_else(|_| "true".to_string()),
                )?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://data/foi.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
            },
            country: CountryConfig {
                iso_country_code: iso_country_code.as_str().to_string(),
            },
            geolocation: GeolocationConfig {
                gaze_url: env::var("GAZE_URL")
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default(),
                timeout_seconds: parse_positive(
                    "GEOLOCATION_TIMEOUT_SECONDS",
                    &env::var("GEOLOCATION_TIMEOUT_SECONDS").unwrap_or_else(|_| "5".to_string()),
                )?,
            },
            rate_limit: RateLimitConfig {
                per_second: parse_positive(
                    "RATE_LIMIT_PER_SECOND",
                    &env::var("RATE_LIMIT_PER_SECOND").unwrap_or_else(|_| "5".to_string()),
                )?,
                burst: parse_positive(
                    "RATE_LIMIT_BURST",
                    &env::var("RATE_LIMIT_BURST").unwrap_or_else(|_| "20".to_string()),
                )?,
            },
        })
    }
}

/// A number that must be at least 1; zero would silently disable the feature.
fn parse_positive<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value >= T::from(1) => Ok(value),
        _ => Err(ConfigError::InvalidValue(name.to_string())),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name.to_string())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                frontend_url: "http://localhost:3000".to_string(),
                trust_forwarded_headers: true,
            },
            database: DatabaseConfig {
                url: "sqlite://data/foi.db".to_string(),
                max_connections: 5,
            },
            country: CountryConfig {
                iso_country_code: "GB".to_string(),
            },
            geolocation: GeolocationConfig {
                gaze_url: String::new(),
                timeout_seconds: 5,
            },
            rate_limit: RateLimitConfig {
                per_second: 5,
                burst: 20,
            },
        }
    }
}
