/// A freedom of information website serving one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoiWebsite {
    pub country_code: &'static str,
    /// Country name as the site itself writes it
    pub country_name: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    /// Languages the site is published in, most used first
    pub languages: &'static [&'static str],
}

static WEBSITES: &[FoiWebsite] = &[
    FoiWebsite {
        country_code: "GB",
        country_name: "United Kingdom",
        name: "WhatDoTheyKnow",
        url: "https://www.whatdotheyknow.com",
        languages: &["en"],
    },
    FoiWebsite {
        country_code: "NZ",
        country_name: "New Zealand",
        name: "FYI",
        url: "https://fyi.org.nz",
        languages: &["en"],
    },
    FoiWebsite {
        country_code: "AU",
        country_name: "Australia",
        name: "Right to Know",
        url: "https://www.righttoknow.org.au",
        languages: &["en"],
    },
    FoiWebsite {
        country_code: "IE",
        country_name: "Ireland",
        name: "Right To Know",
        url: "https://www.righttoknow.ie",
        languages: &["en"],
    },
    FoiWebsite {
        country_code: "ES",
        country_name: "España",
        name: "Tu Derecho a Saber",
        url: "http://tuderechoasaber.es",
        languages: &["es"],
    },
    FoiWebsite {
        country_code: "UY",
        country_name: "Uruguay",
        name: "Qué Sabés",
        url: "http://www.quesabes.org",
        languages: &["es"],
    },
    FoiWebsite {
        country_code: "DE",
        country_name: "Deutschland",
        name: "Frag den Staat",
        url: "https://fragdenstaat.de",
        languages: &["de"],
    },
    FoiWebsite {
        country_code: "AT",
        country_name: "Österreich",
        name: "Frag den Staat",
        url: "https://fragdenstaat.at",
        languages: &["de"],
    },
    FoiWebsite {
        country_code: "HU",
        country_name: "Magyarország",
        name: "KiMitTud",
        url: "https://kimittud.hu",
        languages: &["hu"],
    },
    FoiWebsite {
        country_code: "UA",
        country_name: "Україна",
        name: "Доступ до правди",
        url: "https://dostup.pravda.com.ua",
        languages: &["uk"],
    },
    FoiWebsite {
        country_code: "BR",
        country_name: "Brasil",
        name: "Queremos Saber",
        url: "https://queremossaber.org.br",
        languages: &["pt"],
    },
];

/// Case-insensitive lookup by two-letter country code.
pub fn by_code(code: &str) -> Option<&'static FoiWebsite> {
    WEBSITES
        .iter()
        .find(|site| site.country_code.eq_ignore_ascii_case(code))
}
