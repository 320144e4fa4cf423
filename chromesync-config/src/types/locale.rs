//! Locale tag for the UI language.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FieldErrorKind;

/// Language and region, e.g. `en-US`.
static LOCALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]{2})-([A-Z]{2})$")
        .expect("locale regex is a compile-time constant and must be valid")
});

/// A `language-REGION` locale tag such as `en-US` or `de-DE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    /// Two-letter lowercase language subtag.
    pub fn language(&self) -> &str {
        &self.0[..2]
    }

    /// Two-letter uppercase region subtag.
    pub fn region(&self) -> &str {
        &self.0[3..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale("en-US".to_string())
    }
}

impl FromStr for Locale {
    type Err = FieldErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if LOCALE_PATTERN.is_match(s) {
            Ok(Locale(s.to_string()))
        } else {
            Err(FieldErrorKind::InvalidFormat {
                value: s.to_string(),
                expected: "locale tag (e.g. en-US)",
            })
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = FieldErrorKind;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
