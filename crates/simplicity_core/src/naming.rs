//! Identifier naming helpers used by schema derivation.
//!
//! # Responsibility
//! - Convert between camelCase type/field names and snake_case SQL names.
//! - Reject identifiers that cannot be emitted unquoted into SQL text.
//!
//! # Invariants
//! - Conversions are pure: the same input always yields the same output.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static UPPER_AFTER_CHAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)(\p{Lu})").expect("static snake_case pattern is valid"));
static UNDERSCORE_LOWER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_([a-z])").expect("static camelCase pattern is valid"));
static SQL_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern is valid")
});

/// Converts `camelCase` / `PascalCase` into `snake_case`.
pub fn convert_to_snake_case(input: &str) -> String {
    UPPER_AFTER_CHAR
        .replace_all(input, "${1}_${2}")
        .to_lowercase()
}

/// Converts `snake_case` into `camelCase`.
pub fn convert_to_camel_case(input: &str) -> String {
    UNDERSCORE_LOWER
        .replace_all(input, |caps: &Captures<'_>| caps[1].to_uppercase())
        .into_owned()
}

/// Uppercases the first character.
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns whether `value` can be written into SQL text without quoting.
pub fn is_valid_identifier(value: &str) -> bool {
    SQL_IDENTIFIER.is_match(value)
}

/// Strips module path and generic arguments from a `std::any::type_name`.
pub(crate) fn short_type_name(full: &str) -> &str {
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
}
