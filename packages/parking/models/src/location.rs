//! Location keys used to join the three parking datasets.
//!
//! A [`LocationKey`] is a trimmed, upper-cased street or address string.
//! Infractions and street parking join on exact key equality; parking lots
//! join more loosely (see [`LocationKey::matches_lot_address`]) because lot
//! addresses carry house numbers and vary in formatting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A normalized street or address identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(String);

impl LocationKey {
    /// Normalizes `raw` into a key. Returns `None` for blank input.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-insensitive match against a street field.
    #[must_use]
    pub fn matches_street(&self, street: &str) -> bool {
        street.trim().to_uppercase() == self.0
    }

    /// Loose match against a parking lot address.
    ///
    /// True when the upper-cased address contains the key, or when the
    /// address with its leading house number removed equals the key.
    #[must_use]
    pub fn matches_lot_address(&self, address: &str) -> bool {
        let upper = address.trim().to_uppercase();
        if upper.is_empty() {
            return false;
        }
        upper.contains(&self.0) || strip_street_number(&upper) == self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Drops a purely numeric leading token from an address.
///
/// `"100 REGINA ST S"` becomes `"REGINA ST S"`. Addresses without a leading
/// house number, or consisting of the number alone, are returned unchanged.
#[must_use]
pub fn strip_street_number(address: &str) -> String {
    let parts: Vec<&str> = address.split_whitespace().collect();
    match parts.split_first() {
        Some((first, rest))
            if !rest.is_empty() && first.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.join(" ")
        }
        _ => address.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_house_number() {
        assert_eq!(strip_street_number("100 REGINA ST S"), "REGINA ST S");
    }

    #[test]
    fn leaves_address_without_number() {
        assert_eq!(strip_street_number("REGINA ST S"), "REGINA ST S");
    }

    #[test]
    fn leaves_alphanumeric_leading_token() {
        assert_eq!(strip_street_number("100A KING ST"), "100A KING ST");
    }

    #[test]
    fn leaves_lone_number() {
        assert_eq!(strip_street_number("100"), "100");
    }

    #[test]
    fn key_is_trimmed_and_upper_cased() {
        let key = LocationKey::new("  king st n ").unwrap();
        assert_eq!(key.as_str(), "KING ST N");
        assert!(LocationKey::new("   ").is_none());
    }

    #[test]
    fn street_match_is_exact() {
        let key = LocationKey::new("KING ST N").unwrap();
        assert!(key.matches_street("king st n"));
        assert!(!key.matches_street("KING ST"));
    }

    #[test]
    fn lot_match_uses_substring_or_stripped_number() {
        let key = LocationKey::new("REGINA ST S").unwrap();
        assert!(key.matches_lot_address("100 Regina St S"));
        assert!(key.matches_lot_address("REGINA ST S REAR LOT"));
        assert!(!key.matches_lot_address("100 KING ST N"));
        assert!(!key.matches_lot_address(""));
    }
}
