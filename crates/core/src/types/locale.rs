//! Display languages and per-language text.
//!
//! Catalog and company records carry every customer-facing string in four
//! languages. Translations are optional in practice, so lookups fall back to
//! English when a translation is blank.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A supported display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ur,
    Ar,
}

impl Language {
    /// All languages in display order.
    pub const ALL: [Self; 4] = [Self::En, Self::Hi, Self::Ur, Self::Ar];

    /// Two-letter language code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ur => "ur",
            Self::Ar => "ar",
        }
    }

    /// Whether text in this language is laid out right-to-left.
    #[must_use]
    pub const fn is_rtl(&self) -> bool {
        matches!(self, Self::Ur | Self::Ar)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "en" => Ok(Self::En),
            "hi" => Ok(Self::Hi),
            "ur" => Ok(Self::Ur),
            "ar" => Ok(Self::Ar),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// One string per supported language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    #[serde(default)]
    pub hi: String,
    #[serde(default)]
    pub ur: String,
    #[serde(default)]
    pub ar: String,
}

impl LocalizedText {
    /// Text with only the English value filled in.
    #[must_use]
    pub fn english(text: impl Into<String>) -> Self {
        Self {
            en: text.into(),
            ..Self::default()
        }
    }

    /// Text for `language`, falling back to English when blank.
    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        let text = match language {
            Language::En => &self.en,
            Language::Hi => &self.hi,
            Language::Ur => &self.ur,
            Language::Ar => &self.ar,
        };
        if text.trim().is_empty() { &self.en } else { text }
    }

    /// Whether the English text is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty()
    }
}

/// One list of strings per supported language (product feature bullets).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedList {
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub hi: Vec<String>,
    #[serde(default)]
    pub ur: Vec<String>,
    #[serde(default)]
    pub ar: Vec<String>,
}

impl LocalizedList {
    /// Entries for `language`, falling back to English when empty.
    #[must_use]
    pub fn get(&self, language: Language) -> &[String] {
        let list = match language {
            Language::En => &self.en,
            Language::Hi => &self.hi,
            Language::Ur => &self.ur,
            Language::Ar => &self.ar,
        };
        if list.is_empty() { &self.en } else { list }
    }

    /// Drop blank entries from every language.
    #[must_use]
    pub fn without_blanks(mut self) -> Self {
        for list in [&mut self.en, &mut self.hi, &mut self.ur, &mut self.ar] {
            list.retain(|entry| !entry.trim().is_empty());
        }
        self
    }
}
