/*
Simple i18n helper for the service.

This module provides:
- A tiny embedded translations store for EN/ES/DE (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- A `t` convenience wrapper using the default language (DEFAULT_LANG).
- `negotiate_language`, which picks the best catalog language for an
  `Accept-Language` header, restricted to a set of candidate languages.

Usage:
    use crate::i18n;
    let msg = i18n::t("not_found.route");
    let lang = i18n::negotiate_language(Some("es-ES,es;q=0.9"), &["es"]);
    let msg_with = i18n::tr(Some(&lang), "messages.outside_country", Some(&[("url", "/help"), ("country_name", "España")]));

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `en`. If a key is missing for the requested language,
  the fallback language will be used.
- Message values may contain HTML; callers substitute trusted values only.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "messages.other_country_site": "Hello! You can make Freedom of Information requests within {country_name} at {link_to_website}",
  "messages.outside_country": "Hello! We have an  <a href=\"{url}\">important message</a> for visitors outside {country_name}",
  "validation.alert_type_invalid": "Unknown alert type: {alert_type}",
  "not_found.route": "No such page"
}
"#;

const ES_JSON: &str = r#"
{
  "messages.other_country_site": "¡Hola! Puede hacer solicitudes de información en {country_name} a través de {link_to_website}",
  "messages.outside_country": "¡Hola! Tenemos un  <a href=\"{url}\">mensaje importante</a> para visitantes fuera de {country_name}",
  "validation.alert_type_invalid": "Tipo de alerta desconocido: {alert_type}",
  "not_found.route": "No existe esa página"
}
"#;

const DE_JSON: &str = r#"
{
  "messages.other_country_site": "Hallo! Sie können Informationsfreiheitsanfragen in {country_name} über {link_to_website} stellen",
  "messages.outside_country": "Hallo! Wir haben eine  <a href=\"{url}\">wichtige Nachricht</a> für Besucher außerhalb von {country_name}",
  "validation.alert_type_invalid": "Unbekannter Benachrichtigungstyp: {alert_type}",
  "not_found.route": "Diese Seite existiert nicht"
}
"#;

fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    for (lang, raw) in [("en", EN_JSON), ("es", ES_JSON), ("de", DE_JSON)] {
        let map: HashMap<String, String> = serde_json::from_str(raw).unwrap_or_else(|e| {
            panic!("failed to parse {} translations in i18n module: {}", lang, e);
        });
        out.insert(lang.to_string(), map);
    }

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Normalize a language tag into a short, lowercase code (e.g. "es-ES" -> "es").
pub fn normalize_language(lang: &str) -> String {
    lang.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or(lang)
        .to_lowercase()
}

/// Returns true if the given language code has a translation catalog.
pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Parse an `Accept-Language` header into normalized language codes, most
/// preferred first. Entries with `q=0`, wildcards and malformed weights are
/// dropped; equal weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut weighted: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }

            let mut quality = 1.0_f32;
            for param in parts {
                if let Some(q) = param.trim().strip_prefix("q=") {
                    quality = q.trim().parse().ok()?;
                }
            }

            (quality > 0.0).then(|| (normalize_language(tag), quality))
        })
        .collect();

    // sort_by is stable, so ties stay in header order
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out: Vec<String> = Vec::with_capacity(weighted.len());
    for (lang, _) in weighted {
        if !out.contains(&lang) {
            out.push(lang);
        }
    }
    out
}

/// Pick the visitor's most preferred language that has a catalog and is one
/// of `candidates`. An empty candidate list accepts any catalog language.
/// Falls back to DEFAULT_LANG.
pub fn negotiate_language(accept_language: Option<&str>, candidates: &[&str]) -> String {
    accept_language
        .map(parse_accept_language)
        .unwrap_or_default()
        .into_iter()
        .find(|lang| {
            is_supported_language(lang)
                && (candidates.is_empty() || candidates.contains(&lang.as_str()))
        })
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

/// Translate a key using an explicit language (or default if None).
///
/// - `lang`: optional language code (`"en"`, `"es"`, ...). If None, DEFAULT_LANG is used.
/// - `key`: translation key (flat string, e.g. "messages.outside_country").
/// - `params`: optional slice of (name, value) for placeholder replacement.
///
/// If no translation is found, returns the default language value or the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        // If still missing, return the key itself (useful in logs)
        .unwrap_or_else(|| key.to_string());

    match params {
        Some(params) => params.iter().fold(val, |s, (k, v)| {
            s.replace(&format!("{{{}}}", k), v)
        }),
        None => val,
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}

/// Convenience wrapper with params (default language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tr_with_params() {
        let s = tr(
            Some("es"),
            "messages.other_country_site",
            Some(&[("country_name", "España"), ("link_to_website", "<a>x</a>")]),
        );
        assert!(s.starts_with("¡Hola! Puede hacer solicitudes de información en España"));
        assert!(s.ends_with("<a>x</a>"));
    }

    #[test]
    fn test_fallback_to_default() {
        let s = tr(Some("fr"), "not_found.route", None);
        assert_eq!(s, "No such page");
    }

    #[test]
    fn missing_key_returns_key() {
        let k = "non.existent.key";
        assert_eq!(t(k), k.to_string());
    }

    #[test]
    fn t_with_uses_default_language() {
        let s = t_with("validation.alert_type_invalid", &[("alert_type", "weekly")]);
        assert_eq!(s, "Unknown alert type: weekly");
    }

    #[test]
    fn test_is_supported_language() {
        assert!(is_supported_language("en"));
        assert!(is_supported_language("es"));
        assert!(is_supported_language("de"));
        assert!(!is_supported_language("fr"));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("es-ES"), "es");
        assert_eq!(normalize_language("de_AT"), "de");
        assert_eq!(normalize_language(" EN-us"), "en");
    }

    #[test]
    fn accept_language_is_ordered_by_quality() {
        assert_eq!(
            parse_accept_language("de;q=0.5, es-ES, en;q=0.8, *;q=0.1"),
            vec!["es", "en", "de"]
        );
        assert_eq!(parse_accept_language("fr;q=0, es"), vec!["es"]);
        assert_eq!(parse_accept_language("es-ES,es;q=0.9"), vec!["es"]);
        assert!(parse_accept_language("").is_empty());
    }

    #[test]
    fn negotiation_respects_candidates() {
        assert_eq!(negotiate_language(Some("es"), &["es"]), "es");
        // visitor prefers Spanish but the site only speaks German
        assert_eq!(negotiate_language(Some("es, de;q=0.5"), &["de"]), "de");
        assert_eq!(negotiate_language(Some("es"), &["hu"]), DEFAULT_LANG);
        assert_eq!(negotiate_language(Some("fr, de;q=0.3"), &[]), "de");
        assert_eq!(negotiate_language(None, &["es"]), DEFAULT_LANG);
    }
}
