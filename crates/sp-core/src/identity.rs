//! Shared identity-matching primitives.
//!
//! Name splitting, phone-number key derivation, and the ordered matcher
//! chain are used by both the contact resolver and the reveal authorizer,
//! so they live here rather than in either consumer.

use serde::{Deserialize, Serialize};

/// Structured name parts derived from a free-text name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameParts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl NameParts {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.name.is_none()
    }
}

/// Splits a free-text name into structured parts.
///
/// A single whitespace-delimited token stays unsplit (`name` only). Two or
/// more tokens become first token / remaining tokens, with the trimmed
/// original retained as the display name. Empty input yields empty parts.
pub fn split_full_name(raw: &str) -> NameParts {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NameParts::default();
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() == 1 {
        return NameParts {
            name: Some(trimmed.to_string()),
            ..NameParts::default()
        };
    }
    NameParts {
        first_name: Some(tokens[0].to_string()),
        last_name: Some(tokens[1..].join(" ")),
        name: Some(trimmed.to_string()),
    }
}

/// Strips everything but ASCII digits.
pub fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Derives the candidate search keys for a phone number.
///
/// Callers supply numbers formatted every which way: punctuation, spaces,
/// with or without country code, sometimes only the local part. The
/// candidate set is the raw trimmed input, the full digit string, and the
/// last-10 / last-7 digit suffixes when the number is long enough. Empty
/// entries are dropped and exact duplicates collapse, keeping first
/// occurrence order.
pub fn phone_candidate_keys(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().to_string();
    let all = digits(&trimmed);
    let last10 = if all.len() >= 10 {
        all[all.len() - 10..].to_string()
    } else {
        String::new()
    };
    let last7 = if all.len() >= 7 {
        all[all.len() - 7..].to_string()
    } else {
        String::new()
    };

    let mut keys = Vec::new();
    for key in [trimmed, all, last10, last7] {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// One key in the resolver's priority chain.
///
/// The chain is an ordered list evaluated short-circuit: the first key
/// whose registry search returns a record wins. Reordering or adding a key
/// is a data change in [`match_keys`], not a control-flow change in the
/// resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKey {
    Email(String),
    Phone(String),
    Name(String),
}

impl MatchKey {
    /// The registry query string for this key.
    pub fn query(&self) -> &str {
        match self {
            MatchKey::Email(q) | MatchKey::Phone(q) | MatchKey::Name(q) => q,
        }
    }

    /// A short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            MatchKey::Email(_) => "email",
            MatchKey::Phone(_) => "phone",
            MatchKey::Name(_) => "name",
        }
    }
}

/// Builds the ordered matcher chain for a set of identity fields:
/// email first, then phone, then full name. Blank fields are skipped.
pub fn match_keys(
    email: Option<&str>,
    phone: Option<&str>,
    name: Option<&str>,
) -> Vec<MatchKey> {
    let mut keys = Vec::new();
    if let Some(email) = email.map(str::trim).filter(|s| !s.is_empty()) {
        keys.push(MatchKey::Email(email.to_string()));
    }
    if let Some(phone) = phone.map(str::trim).filter(|s| !s.is_empty()) {
        keys.push(MatchKey::Phone(phone.to_string()));
    }
    if let Some(name) = name.map(str::trim).filter(|s| !s.is_empty()) {
        keys.push(MatchKey::Name(name.to_string()));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token_name_is_not_split() {
        let parts = split_full_name("Ana");
        assert_eq!(parts.name.as_deref(), Some("Ana"));
        assert_eq!(parts.first_name, None);
        assert_eq!(parts.last_name, None);
    }

    #[test]
    fn multi_token_name_splits_first_and_rest() {
        let parts = split_full_name("Ana Maria Perez");
        assert_eq!(parts.first_name.as_deref(), Some("Ana"));
        assert_eq!(parts.last_name.as_deref(), Some("Maria Perez"));
        assert_eq!(parts.name.as_deref(), Some("Ana Maria Perez"));
    }

    #[test]
    fn name_split_collapses_interior_whitespace() {
        let parts = split_full_name("  Ana   Maria\tPerez ");
        assert_eq!(parts.first_name.as_deref(), Some("Ana"));
        assert_eq!(parts.last_name.as_deref(), Some("Maria Perez"));
    }

    #[test]
    fn empty_name_yields_empty_parts() {
        assert!(split_full_name("").is_empty());
        assert!(split_full_name("   ").is_empty());
    }

    #[test]
    fn digits_strips_formatting() {
        assert_eq!(digits("+1 (718) 555-1212"), "17185551212");
        assert_eq!(digits("no digits"), "");
    }

    #[test]
    fn phone_keys_for_formatted_number() {
        let keys = phone_candidate_keys("+1 (718) 555-1212");
        assert_eq!(
            keys,
            vec![
                "+1 (718) 555-1212".to_string(),
                "17185551212".to_string(),
                "7185551212".to_string(),
                "5551212".to_string(),
            ]
        );
    }

    #[test]
    fn six_digit_number_has_no_suffix_keys() {
        let keys = phone_candidate_keys("555-123");
        assert_eq!(keys, vec!["555-123".to_string(), "555123".to_string()]);
    }

    #[test]
    fn bare_digit_string_collapses_duplicates() {
        // Raw input already equals the digit string and the last-10 suffix.
        let keys = phone_candidate_keys("7185551212");
        assert_eq!(keys, vec!["7185551212".to_string(), "5551212".to_string()]);
    }

    #[test]
    fn match_keys_preserve_priority_order() {
        let keys = match_keys(Some("a@x.com"), Some("555-1212"), Some("Ana Perez"));
        assert_eq!(
            keys,
            vec![
                MatchKey::Email("a@x.com".to_string()),
                MatchKey::Phone("555-1212".to_string()),
                MatchKey::Name("Ana Perez".to_string()),
            ]
        );
    }

    #[test]
    fn match_keys_skip_blank_fields() {
        let keys = match_keys(None, Some("   "), Some("Ana"));
        assert_eq!(keys, vec![MatchKey::Name("Ana".to_string())]);
    }
}
