#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display languages offered to the user.
///
/// Turkish doubles as the pivot language: the corpus and the default prompt
/// are Turkish, so answers are produced in Turkish before translation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "ru")]
    Russian,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown language: {0} (expected one of tr, en, fr, de, es, ru)")]
pub struct UnknownLanguage(pub String);

impl Language {
    pub const ALL: [Self; 6] = [
        Self::Turkish,
        Self::English,
        Self::French,
        Self::German,
        Self::Spanish,
        Self::Russian,
    ];

    /// ISO 639-1 code, as understood by the translation endpoint
    #[inline]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Turkish => "tr",
            Self::English => "en",
            Self::French => "fr",
            Self::German => "de",
            Self::Spanish => "es",
            Self::Russian => "ru",
        }
    }

    /// Name of the language in the language itself
    #[inline]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::Turkish => "Türkçe",
            Self::English => "English",
            Self::French => "Français",
            Self::German => "Deutsch",
            Self::Spanish => "Español",
            Self::Russian => "Русский",
        }
    }

    #[inline]
    pub const fn english_name(self) -> &'static str {
        match self {
            Self::Turkish => "Turkish",
            Self::English => "English",
            Self::French => "French",
            Self::German => "German",
            Self::Spanish => "Spanish",
            Self::Russian => "Russian",
        }
    }

    /// Label shown in language pickers, e.g. "Türkçe TR"
    #[inline]
    pub fn label(self) -> String {
        format!("{} {}", self.native_name(), self.code().to_uppercase())
    }
}

impl fmt::Display for Language {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|language| {
                language.code() == needle
                    || language.english_name().to_lowercase() == needle
                    || language.native_name().to_lowercase() == needle
            })
            .ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}
