// src/normalization/address.rs

/// Street-suffix abbreviations expanded to their full form.
const STREET_SUFFIXES: [(&str, &str); 14] = [
    ("st", "street"),
    ("str", "street"),
    ("rd", "road"),
    ("ave", "avenue"),
    ("av", "avenue"),
    ("blvd", "boulevard"),
    ("blv", "boulevard"),
    ("dr", "drive"),
    ("ln", "lane"),
    ("ct", "court"),
    ("pl", "place"),
    ("sq", "square"),
    ("pkwy", "parkway"),
    ("cir", "circle"),
];

/// Unit/suite designators. Each is removed together with the unit number
/// that follows it; `#12`-style markers are removed on their own.
pub const UNIT_NOISE_TOKENS: [&str; 11] = [
    "apt",
    "apartment",
    "suite",
    "ste",
    "unit",
    "bldg",
    "building",
    "fl",
    "floor",
    "room",
    "rm",
];

/// Lowercases, strips punctuation, expands street suffixes and drops
/// unit/suite noise so that `123 Main St., Apt 4B` and `123 main street`
/// compare equal.
pub fn normalize_address_line(address: &str) -> String {
    let cleaned: String = address
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '#' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut tokens: Vec<&str> = Vec::new();
    let mut iter = cleaned.split_whitespace().peekable();
    while let Some(token) = iter.next() {
        if UNIT_NOISE_TOKENS.contains(&token) {
            if iter.peek().is_some_and(|next| is_unit_number(next)) {
                iter.next();
            }
            continue;
        }
        if let Some(rest) = token.strip_prefix('#') {
            let bare_marker = rest.trim_start_matches('#').is_empty();
            if bare_marker && iter.peek().is_some_and(|next| is_unit_number(next)) {
                iter.next();
            }
            continue;
        }
        let expanded = STREET_SUFFIXES
            .iter()
            .find(|(abbr, _)| *abbr == token)
            .map(|(_, full)| *full)
            .unwrap_or(token);
        tokens.push(expanded);
    }
    tokens.join(" ")
}

fn is_unit_number(token: &str) -> bool {
    token.chars().any(|c| c.is_ascii_digit()) || token.chars().count() <= 2
}
