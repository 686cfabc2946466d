// Anchored token patterns for column rule validation

use once_cell::sync::Lazy;
use regex::Regex;

// ASCII word characters only
static CSS_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("invalid css class regex"));

static SIGNED_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+]?[0-9]+(\.[0-9]+)?$").expect("invalid decimal regex"));

static WIDTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,3}$").expect("invalid width regex"));

static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("invalid label regex"));

/// CSS class names are restricted to word characters
pub fn is_css_class(s: &str) -> bool {
    CSS_CLASS.is_match(s)
}

/// Graph bound: optionally signed decimal such as `-12.5`
pub fn parse_signed_decimal(s: &str) -> Option<f64> {
    if SIGNED_DECIMAL.is_match(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Pixel width: one to three digits
pub fn parse_width(s: &str) -> Option<u32> {
    if WIDTH.is_match(s) {
        s.parse().ok()
    } else {
        None
    }
}

/// Footer label token: a letter followed by word characters
pub fn is_label(s: &str) -> bool {
    LABEL.is_match(s)
}
