//! Audible marketplace locales.
//!
//! Each country code maps to an Audible API host and an Amazon auth host.

/// A resolved marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    /// Two-letter country code.
    pub country_code: &'static str,
    /// Domain suffix for `api.audible.*`.
    pub audible_domain: &'static str,
    /// Domain suffix for `api.amazon.*`.
    pub amazon_domain: &'static str,
}

const LOCALES: &[Locale] = &[
    Locale { country_code: "us", audible_domain: "com", amazon_domain: "com" },
    Locale { country_code: "ca", audible_domain: "ca", amazon_domain: "ca" },
    Locale { country_code: "uk", audible_domain: "co.uk", amazon_domain: "co.uk" },
    Locale { country_code: "au", audible_domain: "com.au", amazon_domain: "com.au" },
    Locale { country_code: "fr", audible_domain: "fr", amazon_domain: "fr" },
    Locale { country_code: "de", audible_domain: "de", amazon_domain: "de" },
    Locale { country_code: "jp", audible_domain: "co.jp", amazon_domain: "co.jp" },
    Locale { country_code: "it", audible_domain: "it", amazon_domain: "it" },
    Locale { country_code: "in", audible_domain: "in", amazon_domain: "in" },
    Locale { country_code: "es", audible_domain: "es", amazon_domain: "es" },
];

impl Locale {
    /// Resolves a country code. `None` or an empty string selects the US
    /// marketplace.
    pub fn resolve(country_code: Option<&str>) -> Result<Self, String> {
        let code = match country_code {
            None | Some("") => "us",
            Some(code) => code,
        };
        let lower = code.to_lowercase();
        LOCALES
            .iter()
            .find(|l| l.country_code == lower)
            .copied()
            .ok_or_else(|| format!("unknown country code: {code}"))
    }

    /// Base URL of the Audible API for this marketplace.
    pub fn audible_api_base(&self) -> String {
        format!("https://api.audible.{}", self.audible_domain)
    }

    /// Base URL of the Amazon auth API for this marketplace.
    pub fn amazon_api_base(&self) -> String {
        format!("https://api.amazon.{}", self.amazon_domain)
    }
}
