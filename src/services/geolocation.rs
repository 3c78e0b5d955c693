//! Visitor country lookup.
//!
//! `CountryResolver` is the seam between the country message logic and the
//! outside world. `GazeCountryResolver` asks a gaze service over HTTP; tests
//! substitute their own implementation.

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::GeolocationConfig;
use crate::error::{AppError, AppResult};

/// A country answer is two letters and maybe a newline; anything longer is
/// not worth reading.
const MAX_BODY_BYTES: usize = 64;

/// Upper-cased two-letter ISO 3166 country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Accepts exactly two ASCII letters (surrounding whitespace ignored), any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == 2 && raw.bytes().all(|b| b.is_ascii_alphabetic()) {
            Some(Self(raw.to_ascii_uppercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupFailure {
    #[error("Geolocation lookup is not configured")]
    Disabled,

    #[error("Unable to open third-party URL {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unable to open third-party URL {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Unexpected response from third-party URL {url}: {body:?}")]
    InvalidBody { url: String, body: String },
}

#[async_trait]
pub trait CountryResolver: Send + Sync + 'static {
    async fn resolve(&self, ip: IpAddr) -> Result<CountryCode, LookupFailure>;
}

/// Resolves countries through a gaze service (`/gaze-rest?f=get_country_from_ip`).
#[derive(Clone)]
pub struct GazeCountryResolver {
    client: reqwest::Client,
    base_url: String,
}

impl GazeCountryResolver {
    pub fn new(config: &GeolocationConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, &config.gaze_url))
    }

    /// Use an existing client; its timeout bounds each lookup.
    pub fn with_client(client: reqwest::Client, gaze_url: &str) -> Self {
        Self {
            client,
            base_url: gaze_url.trim().trim_end_matches('/').to_string(),
        }
    }

    fn lookup_url(&self, ip: IpAddr) -> String {
        format!("{}/gaze-rest?f=get_country_from_ip;ip={}", self.base_url, ip)
    }
}

#[async_trait]
impl CountryResolver for GazeCountryResolver {
    async fn resolve(&self, ip: IpAddr) -> Result<CountryCode, LookupFailure> {
        if self.base_url.is_empty() {
            return Err(LookupFailure::Disabled);
        }

        let url = self.lookup_url(ip);

        // Single attempt: the caller is waiting on an interactive response.
        let mut response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(source) => return Err(LookupFailure::Request { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(LookupFailure::Status { url, status });
        }

        let mut bytes = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    bytes.extend_from_slice(&chunk);
                    if bytes.len() > MAX_BODY_BYTES {
                        break;
                    }
                }
                Ok(None) => break,
                Err(source) => return Err(LookupFailure::Request { url, source }),
            }
        }

        let oversized = bytes.len() > MAX_BODY_BYTES;
        bytes.truncate(MAX_BODY_BYTES);
        let body = String::from_utf8_lossy(&bytes).into_owned();

        match CountryCode::parse(&body) {
            Some(code) if !oversized => Ok(code),
            _ => Err(LookupFailure::InvalidBody { url, body }),
        }
    }
}

/// Test double that always answers with the same country (or failure).
#[cfg(test)]
pub(crate) struct FixedCountryResolver(pub Option<&'static str>);

#[cfg(test)]
#[async_trait]
impl CountryResolver for FixedCountryResolver {
    async fn resolve(&self, _ip: IpAddr) -> Result<CountryCode, LookupFailure> {
        match self.0 {
            Some(code) => CountryCode::parse(code).ok_or_else(|| LookupFailure::InvalidBody {
                url: "fixed".to_string(),
                body: code.to_string(),
            }),
            None => Err(LookupFailure::Disabled),
        }
    }
}

/// Resolver for a local stub, bypassing any proxy configured in the environment.
#[cfg(test)]
pub(crate) fn local_resolver(gaze_url: &str) -> GazeCountryResolver {
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    GazeCountryResolver::with_client(client, gaze_url)
}

/// Serve `body` with `status` on `/gaze-rest` from a local port; returns the base URL.
#[cfg(test)]
pub(crate) async fn spawn_gaze_stub(status: axum::http::StatusCode, body: &'static str) -> String {
    use axum::{routing::get, Router};

    let app = Router::new().route("/gaze-rest", get(move || async move { (status, body) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    const VISITOR: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(203, 0, 113, 7));

    fn resolver_for(gaze_url: &str) -> GazeCountryResolver {
        local_resolver(gaze_url)
    }

    #[test]
    fn builds_from_config() {
        let r = GazeCountryResolver::new(&GeolocationConfig {
            gaze_url: "http://gaze.example.org//".to_string(),
            timeout_seconds: 1,
        })
        .unwrap();
        assert_eq!(r.base_url, "http://gaze.example.org");
    }

    #[test]
    fn country_code_parsing() {
        assert_eq!(CountryCode::parse("dk\n").unwrap().as_str(), "DK");
        assert_eq!(CountryCode::parse(" ES ").unwrap().to_string(), "ES");
        assert!(CountryCode::parse("").is_none());
        assert!(CountryCode::parse("DEU").is_none());
        assert!(CountryCode::parse("4X").is_none());
        assert!(CountryCode::parse("<html>").is_none());
    }

    #[test]
    fn lookup_url_includes_ip() {
        let r = resolver_for("http://gaze.example.org/");
        assert_eq!(
            r.lookup_url(VISITOR),
            "http://gaze.example.org/gaze-rest?f=get_country_from_ip;ip=203.0.113.7"
        );
    }

    #[tokio::test]
    async fn resolves_country_from_ok_response() {
        let base = spawn_gaze_stub(StatusCode::OK, "DK\n").await;
        let code = resolver_for(&base).resolve(VISITOR).await.unwrap();
        assert_eq!(code.as_str(), "DK");
    }

    #[tokio::test]
    async fn server_error_reports_url_and_status() {
        let base = spawn_gaze_stub(StatusCode::INTERNAL_SERVER_ERROR, "Error").await;
        let err = resolver_for(&base).resolve(VISITOR).await.unwrap_err();

        assert!(matches!(err, LookupFailure::Status { .. }));
        let msg = err.to_string();
        assert!(msg.contains(&base), "{msg}");
        assert!(msg.contains("500 Internal Server Error"), "{msg}");
    }

    #[tokio::test]
    async fn non_country_body_is_a_failure() {
        let base = spawn_gaze_stub(StatusCode::OK, "<html><body>search</body></html>").await;
        let err = resolver_for(&base).resolve(VISITOR).await.unwrap_err();
        assert!(matches!(err, LookupFailure::InvalidBody { .. }));
        assert!(err.to_string().contains(&base));
    }

    #[tokio::test]
    async fn oversized_body_is_cut_short() {
        let huge: &'static str = Box::leak("DK".repeat(512 * 1024).into_boxed_str());
        let base = spawn_gaze_stub(StatusCode::OK, huge).await;
        let err = resolver_for(&base).resolve(VISITOR).await.unwrap_err();

        match err {
            LookupFailure::InvalidBody { body, .. } => assert_eq!(body.len(), MAX_BODY_BYTES),
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_reports_url() {
        // grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = format!("http://{}", addr);
        let err = resolver_for(&base).resolve(VISITOR).await.unwrap_err();
        assert!(matches!(err, LookupFailure::Request { .. }));
        assert!(err.to_string().contains(&base));
    }

    #[tokio::test]
    async fn empty_base_url_disables_lookup() {
        let err = resolver_for("").resolve(VISITOR).await.unwrap_err();
        assert!(matches!(err, LookupFailure::Disabled));
    }
}
