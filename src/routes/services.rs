use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::middleware::rate_limit::visitor_ip;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/other_country_message", get(other_country_message))
}

/// Empty body for visitors in the deployment country (or whose country is
/// unknown), otherwise an HTML fragment pointing them elsewhere. Always 200;
/// never touches cookies or session state.
async fn other_country_message(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ip = visitor_ip(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        state.trust_forwarded_headers,
    );
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());

    let message = state
        .country_messages
        .resolve_message(ip, accept_language)
        .await;

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        message.into_body(),
    )
}
