//! `%NAME%` placeholder expansion for string fields.
//!
//! Only allowlisted variables (and `CHROMESYNC_*` prefixed ones) are resolved
//! by default so that a shared or downloaded config file cannot copy
//! arbitrary environment contents into paths that later show up in logs or
//! exported files.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::FieldErrorKind;

/// Matches an escaped `%%` or a `%NAME%` token.
/// `NAME` allows parentheses for variables like `%PROGRAMFILES(X86)%`.
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%%|%([A-Za-z_][A-Za-z0-9_()]*)%")
        .expect("placeholder regex is a compile-time constant and must be valid")
});

/// Environment variables that placeholders may reference by default.
pub const ALLOWED_PLACEHOLDERS: &[&str] = &[
    // Windows locations
    "TEMP",
    "TMP",
    "APPDATA",
    "LOCALAPPDATA",
    "PROGRAMFILES",
    "PROGRAMFILES(X86)",
    "PROGRAMDATA",
    "USERPROFILE",
    "SYSTEMDRIVE",
    "USERNAME",
    // Unix locations
    "HOME",
    "USER",
    "TMPDIR",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "XDG_STATE_HOME",
    "XDG_CACHE_HOME",
    "XDG_RUNTIME_DIR",
];

/// Which variables a placeholder may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderScope {
    /// [`ALLOWED_PLACEHOLDERS`] plus `CHROMESYNC_*`
    #[default]
    Allowlisted,
    /// Any environment variable
    Any,
}

/// Source of variable values for placeholder expansion.
///
/// The process environment is the production source; tests and embedders
/// pass a map instead of mutating global state.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads from `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Check whether a variable name is on the placeholder allowlist.
///
/// Matching is case-insensitive, as Windows variable names are.
pub fn is_placeholder_allowed(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    ALLOWED_PLACEHOLDERS.contains(&upper.as_str()) || upper.starts_with("CHROMESYNC_")
}

/// Replace every `%NAME%` token in `input` with the variable's value.
///
/// - `%%` is an escape and produces a literal `%`.
/// - A token whose variable is unset fails with
///   [`FieldErrorKind::UnresolvedPlaceholder`]; the literal token is never
///   passed through.
/// - With [`PlaceholderScope::Allowlisted`], a token naming a variable outside
///   the allowlist fails with [`FieldErrorKind::DisallowedPlaceholder`].
/// - A lone `%` that does not start a token is kept as is.
pub fn expand_placeholders(
    input: &str,
    env: &dyn Environment,
    scope: PlaceholderScope,
) -> Result<String, FieldErrorKind> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in PLACEHOLDER_PATTERN.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&input[last..whole.start()]);
        last = whole.end();

        let Some(name) = caps.get(1).map(|m| m.as_str()) else {
            out.push('%');
            continue;
        };

        if scope == PlaceholderScope::Allowlisted && !is_placeholder_allowed(name) {
            return Err(FieldErrorKind::DisallowedPlaceholder {
                name: name.to_string(),
            });
        }

        match env.var(name) {
            Some(value) => out.push_str(&value),
            None => {
                return Err(FieldErrorKind::UnresolvedPlaceholder {
                    name: name.to_string(),
                });
            }
        }
    }

    out.push_str(&input[last..]);
    Ok(out)
}
