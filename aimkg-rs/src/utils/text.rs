//! Text processing utilities.
//!
//! Tokenization here is shared by ingestion-time classification and query-time
//! ranking, so stored entities and live queries are always comparable.

use regex::Regex;
use std::sync::OnceLock;

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static TOKEN_SPLIT_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

fn token_split_re() -> &'static Regex {
    TOKEN_SPLIT_RE.get_or_init(|| Regex::new(r"[\s\-]+").expect("static regex is valid"))
}

/// Replace consecutive whitespace (spaces, tabs, newlines) with a single space
/// and trim leading/trailing whitespace.
///
/// Returns an empty string for inputs that are entirely whitespace.
pub fn normalize_whitespace(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    whitespace_re().replace_all(s, " ").trim().to_string()
}

/// Lower-case `s` and split it on runs of whitespace and hyphens.
///
/// No stemming; empty pieces are dropped. Order is preserved and duplicates
/// are kept, callers that need set semantics collect into a set.
pub fn tokenize(s: &str) -> Vec<String> {
    token_split_re()
        .split(&s.to_lowercase())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalized form of an entity name used inside canonical keys:
/// lower-cased, trimmed, internal whitespace collapsed.
pub fn canonical_name(s: &str) -> String {
    normalize_whitespace(&s.to_lowercase())
}

/// Upper-case the first character and lower-case the rest
/// (`"image classification"` → `"Image classification"`).
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the others
/// (`"image net"` → `"Image Net"`, `"imagenet-1k"` → `"Imagenet-1K"`).
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Drop commas and backslashes so free text survives the interchange files
/// and downstream comma-joined tag parsing.
pub fn strip_interchange_chars(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && *c != '\\').collect()
}
