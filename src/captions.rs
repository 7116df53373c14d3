//! Caption formatting
//!
//! Turns schema names (`shipTo`, `billing_address`, `USAddress`) into the
//! human readable labels used on generated controls.

use once_cell::sync::Lazy;
use regex::Regex;

/// `USAddress` -> `US Address`
static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));

/// `shipTo` -> `ship To`, `line2Item` -> `line2 Item`
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// Humanize a schema name into a caption.
///
/// Separators (`_`, `-`, `.`) become spaces, camelCase is split into
/// words, tokens written entirely in capitals are lower-cased, and each
/// word is capitalized.
///
/// ```
/// use xsdform::captions::create_caption;
///
/// assert_eq!(create_caption("purchaseOrder"), "Purchase Order");
/// assert_eq!(create_caption("ship_to-address"), "Ship To Address");
/// ```
pub fn create_caption(name: &str) -> String {
    let spaced: String = name
        .chars()
        .map(|c| if matches!(c, '_' | '-' | '.') { ' ' } else { c })
        .collect();
    let spaced = ACRONYM_BOUNDARY.replace_all(&spaced, "$1 $2");
    let spaced = CAMEL_BOUNDARY.replace_all(&spaced, "$1 $2");

    spaced
        .split_whitespace()
        .map(|word| {
            let is_all_caps = word.chars().any(|c| c.is_uppercase())
                && !word.chars().any(|c| c.is_lowercase());
            let word = if is_all_caps {
                word.to_lowercase()
            } else {
                word.to_string()
            };
            capitalize(&word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_split() {
        assert_eq!(create_caption("shipTo"), "Ship To");
        assert_eq!(create_caption("line2Item"), "Line2 Item");
    }

    #[test]
    fn test_separators() {
        assert_eq!(create_caption("billing_address"), "Billing Address");
        assert_eq!(create_caption("zip-code"), "Zip Code");
        assert_eq!(create_caption("a.b"), "A B");
        assert_eq!(create_caption("__x__"), "X");
    }

    #[test]
    fn test_all_caps_tokens() {
        assert_eq!(create_caption("USAddress"), "Us Address");
        assert_eq!(create_caption("SKU"), "Sku");
        assert_eq!(create_caption("address Type"), "Address Type");
    }

    #[test]
    fn test_empty() {
        assert_eq!(create_caption(""), "");
        assert_eq!(create_caption("   "), "");
    }
}
