//! Per-visitor limit on the country message endpoint.
//!
//! Each message may cost an outbound geolocation lookup. A visitor over the
//! limit gets the same empty fragment as a visitor whose country is unknown,
//! never an error page.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{body::Body, extract::ConnectInfo};
use governor::middleware::NoOpMiddleware;
use http::{header, HeaderMap, Request, Response, StatusCode};
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::KeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};

pub type CountryMessageLimit = GovernorLayer<VisitorIpKeyExtractor, NoOpMiddleware>;

/// Source address of the visitor.
///
/// With `trust_forwarded_headers` this is the first parseable
/// `X-Forwarded-For` entry, then `X-Real-IP`, then the socket peer. Those
/// headers are client-controlled unless a reverse proxy overwrites them, so
/// deployments reached directly must turn trust off and use the peer only.
pub fn visitor_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_headers: bool,
) -> Option<IpAddr> {
    let peer_ip = peer.map(|addr| addr.ip());
    if !trust_forwarded_headers {
        return peer_ip;
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').find_map(|ip| ip.trim().parse::<IpAddr>().ok()));

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip).or(peer_ip)
}

/// Keys the limiter on the same address the geolocation lookup uses.
#[derive(Debug, Clone, Copy)]
pub struct VisitorIpKeyExtractor {
    pub trust_forwarded_headers: bool,
}

impl KeyExtractor for VisitorIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        visitor_ip(req.headers(), peer, self.trust_forwarded_headers)
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Time to replenish one request of the quota.
pub fn refill_period(per_second: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(per_second.max(1)))
}

/// Empty `200 text/html`, identical to the "no message" answer.
fn empty_fragment() -> Response<Body> {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        http::HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

fn limited_response(error: GovernorError) -> Response<Body> {
    match error {
        GovernorError::TooManyRequests { wait_time, .. } => {
            tracing::debug!("Country message rate limited, retry in {}s", wait_time);
        }
        GovernorError::UnableToExtractKey => {
            tracing::warn!("Unable to determine client IP for rate limiting");
        }
        GovernorError::Other { code, msg, .. } => {
            tracing::warn!("Rate limiting error {}: {:?}", code, msg);
        }
    }
    empty_fragment()
}

pub fn country_message_limit(
    config: &RateLimitConfig,
    trust_forwarded_headers: bool,
) -> AppResult<CountryMessageLimit> {
    let mut builder = GovernorConfigBuilder::default().key_extractor(VisitorIpKeyExtractor {
        trust_forwarded_headers,
    });
    builder.period(refill_period(config.per_second));
    builder.burst_size(config.burst);
    builder.error_handler(limited_response);

    let governor_conf = builder
        .finish()
        .ok_or_else(|| AppError::Config("Rate limit burst must not be zero".to_string()))?;

    Ok(GovernorLayer {
        config: std::sync::Arc::new(governor_conf),
    })
}
