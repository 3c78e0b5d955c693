use std::net::IpAddr;
use std::sync::Arc;

use crate::config::CountryConfig;
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::services::geolocation::{CountryCode, CountryResolver, LookupFailure};
use crate::services::world_foi_websites;

/// What to show a visitor about their country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryMessage {
    Empty,
    Html(String),
}

impl CountryMessage {
    pub fn into_body(self) -> String {
        match self {
            CountryMessage::Empty => String::new(),
            CountryMessage::Html(html) => html,
        }
    }
}

/// Tells visitors from outside the deployment country where they can make
/// requests instead. Lookup failures never surface; they read as "unknown
/// country" and produce no message.
#[derive(Clone)]
pub struct CountryMessageService {
    deployment_country: CountryCode,
    resolver: Arc<dyn CountryResolver>,
}

impl CountryMessageService {
    pub fn new(config: &CountryConfig, resolver: Arc<dyn CountryResolver>) -> AppResult<Self> {
        let deployment_country = CountryCode::parse(&config.iso_country_code).ok_or_else(|| {
            AppError::Config(format!(
                "Invalid deployment country code: {:?}",
                config.iso_country_code
            ))
        })?;

        Ok(Self {
            deployment_country,
            resolver,
        })
    }

    pub fn deployment_country(&self) -> &CountryCode {
        &self.deployment_country
    }

    /// Best-effort country of the visitor. `None` when it cannot be determined.
    pub async fn visitor_country(&self, ip: Option<IpAddr>) -> Option<CountryCode> {
        let ip = ip?;

        match self.resolver.resolve(ip).await {
            Ok(code) => Some(code),
            Err(LookupFailure::Disabled) => None,
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    pub async fn resolve_message(
        &self,
        ip: Option<IpAddr>,
        accept_language: Option<&str>,
    ) -> CountryMessage {
        let visitor = self.visitor_country(ip).await;
        self.message_for(visitor.as_ref(), accept_language)
    }

    /// Decide and render the message for an already resolved visitor country.
    pub fn message_for(
        &self,
        visitor: Option<&CountryCode>,
        accept_language: Option<&str>,
    ) -> CountryMessage {
        let visitor = match visitor {
            Some(code) if *code != self.deployment_country => code,
            _ => return CountryMessage::Empty,
        };

        match world_foi_websites::by_code(visitor.as_str()) {
            Some(site) => {
                let lang = i18n::negotiate_language(accept_language, site.languages);
                let link = format!("<a href=\"{}\">{}</a>", site.url, site.name);
                CountryMessage::Html(i18n::tr(
                    Some(&lang),
                    "messages.other_country_site",
                    Some(&[
                        ("country_name", site.country_name),
                        ("link_to_website", link.as_str()),
                    ]),
                ))
            }
            None => {
                let home = world_foi_websites::by_code(self.deployment_country.as_str());
                let country_name = match home {
                    Some(site) => site.country_name,
                    None => self.deployment_country.as_str(),
                };
                let candidates = home.map(|site| site.languages).unwrap_or(&[]);
                let lang = i18n::negotiate_language(accept_language, candidates);
                let url = format!(
                    "/help/alaveteli?country_name={}",
                    urlencoding::encode(country_name)
                );
                CountryMessage::Html(i18n::tr(
                    Some(&lang),
                    "messages.outside_country",
                    Some(&[("url", url.as_str()), ("country_name", country_name)]),
                ))
            }
        }
    }
}
