//! Interface strings for the supported languages.
//!
//! The table is embedded at compile time and parsed once, on first use.
//! Lookups never fail: a key missing from the table comes back unchanged,
//! so a forgotten translation shows its key rather than an empty label.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::error::Result;

const LOCALES_YAML: &str = include_str!("locales.yaml");

type Table = HashMap<String, HashMap<String, String>>;

static TRANSLATIONS: LazyLock<Table> = LazyLock::new(|| match parse_table(LOCALES_YAML) {
    Ok(table) => table,
    Err(err) => {
        tracing::error!(error = %err, "embedded translation table is invalid; labels will show keys");
        Table::new()
    }
});

fn parse_table(yaml: &str) -> Result<Table> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// An interface language.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// `en`
    #[default]
    English,

    /// `hi`
    Hindi,

    /// `pa`
    Punjabi,
}

impl Locale {
    /// Every supported language, in menu order.
    pub const ALL: [Locale; 3] = [Locale::English, Locale::Hindi, Locale::Punjabi];

    /// Looks a language up by its code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Two-letter code used as the table key.
    pub fn code(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Hindi => "hi",
            Locale::Punjabi => "pa",
        }
    }

    /// The language's own name for itself.
    pub fn native_name(&self) -> &'static str {
        match self {
            Locale::English => "English",
            Locale::Hindi => "हिंदी",
            Locale::Punjabi => "ਪੰਜਾਬੀ",
        }
    }

    /// The language-picker flag.
    pub fn flag(&self) -> &'static str {
        match self {
            Locale::English => "🇺🇸",
            Locale::Hindi | Locale::Punjabi => "🇮🇳",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.flag(), self.native_name())
    }
}

/// Translate `key` into `locale`, returning the key itself when absent.
pub fn t(locale: Locale, key: &str) -> String {
    TRANSLATIONS
        .get(locale.code())
        .and_then(|strings| strings.get(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses() {
        let table = parse_table(LOCALES_YAML).unwrap();
        for locale in Locale::ALL {
            assert!(table.contains_key(locale.code()), "missing {}", locale.code());
        }
    }

    #[test]
    fn every_locale_has_every_english_key() {
        let table = parse_table(LOCALES_YAML).unwrap();
        let english = &table["en"];
        for locale in [Locale::Hindi, Locale::Punjabi] {
            let strings = &table[locale.code()];
            for key in english.keys() {
                assert!(strings.contains_key(key), "{} lacks {key}", locale.code());
            }
        }
    }

    #[test]
    fn lookup_translates() {
        assert_eq!(t(Locale::English, "send"), "Send");
        assert_eq!(t(Locale::Hindi, "send"), "भेजें");
        assert_eq!(t(Locale::Punjabi, "send"), "ਭੇਜੋ");
    }

    #[test]
    fn missing_key_falls_back_to_key() {
        assert_eq!(t(Locale::English, "noSuchKey"), "noSuchKey");
        assert_eq!(t(Locale::Hindi, ""), "");
    }

    #[test]
    fn locale_codes() {
        assert_eq!(Locale::from_code("PA"), Some(Locale::Punjabi));
        assert_eq!(Locale::from_code(" hi "), Some(Locale::Hindi));
        assert_eq!(Locale::from_code("fr"), None);
        assert_eq!(Locale::default(), Locale::English);
    }
}
