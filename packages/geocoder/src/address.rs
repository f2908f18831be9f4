//! Address cleaning before geocoding.
//!
//! Municipal exports carry addresses like `"100 BLOCK OF KING ST N"`,
//! `"ERB ST W EB"` or `"KING ST N / ERB ST W"`. These are normalized into
//! a query string suitable for a free-form geocoder.

use std::sync::LazyLock;

use regex::Regex;

/// Regex for "BLOCK OF" / "BLK OF" noise in addresses.
static BLOCK_OF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+BLOCK\s+OF\s+|\s+BLK\s+OF\s+").expect("valid regex"));

/// Regex for standalone "BLOCK" / "BLK" after a house number, with or
/// without a space between the number and the keyword.
static BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+)\s*(?:BLOCK|BLK)\s+").expect("valid regex"));

/// Regex for travel direction suffixes ("EB", "WB", "NB", "SB").
static DIRECTION_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(EB|WB|NB|SB)$").expect("valid regex"));

/// Regex for runs of whitespace.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Cell values that mean "no address".
static SKIP_PATTERNS: &[&str] = &["UNKNOWN", "N/A", "NA", "NAN", "NONE", "NULL"];

/// Cleans a raw address. Returns `None` when it is not geocodable.
///
/// Intersections written with `/` or `AND` are rewritten with `&`.
#[must_use]
pub fn clean_address(raw: &str) -> Option<String> {
    let addr = WHITESPACE_RE
        .replace_all(raw.trim(), " ")
        .to_uppercase();

    if addr.is_empty() || SKIP_PATTERNS.iter().any(|p| addr == *p) {
        return None;
    }

    let addr = DIRECTION_SUFFIX_RE.replace_all(&addr, "").to_string();

    for sep in [" / ", " /", "/ ", " & ", " AND "] {
        if let Some(idx) = addr.find(sep) {
            let street1 = addr[..idx].trim();
            let street2 = addr[idx + sep.len()..].trim();
            if !street1.is_empty() && !street2.is_empty() {
                return Some(format!("{street1} & {street2}"));
            }
        }
    }

    let addr = BLOCK_OF_RE.replace_all(&addr, " ").to_string();
    let addr = BLOCK_RE.replace(&addr, "$1 ").trim().to_string();

    if addr.is_empty() { None } else { Some(addr) }
}

/// Builds the query sent to the geocoder: `"{address}, {region}"`.
#[must_use]
pub fn build_query(address: &str, region: &str) -> String {
    if region.is_empty() {
        address.to_string()
    } else {
        format!("{address}, {region}")
    }
}
