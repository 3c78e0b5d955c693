//! Sent-alert ledger and visitor country messages for a freedom of
//! information site.
//!
//! The alert ledger (`db::AlertSentRepository`) is used by the notification
//! pipeline to send each kind of alert at most once per user and request.
//! The HTTP side (`routes`) serves the message shown to visitors from
//! outside the deployment country.

pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod middleware;
pub mod routes;
pub mod services;

use services::country_message::CountryMessageService;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub country_messages: CountryMessageService,
    /// Whether `X-Forwarded-For` / `X-Real-IP` name the visitor.
    pub trust_forwarded_headers: bool,
}
