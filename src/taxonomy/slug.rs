use once_cell::sync::Lazy;
use regex::Regex;

static NON_SLUG_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("slug separator pattern is valid"));

/// Derives the canonical URL slug for a display name.
///
/// ASCII letters are lowercased, then every maximal run of characters outside
/// `[a-z0-9]` (including all non-ASCII characters) becomes a single `-`, and
/// leading/trailing `-` are stripped. Blank input yields an empty string,
/// which callers must reject.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_ascii_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}
