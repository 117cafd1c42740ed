// src/schema/address_parsing.rs
use once_cell::sync::Lazy;
use regex::Regex;

static STATE_ZIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<state>[A-Za-z]{2})\s+(?P<zip>\d{5}(?:-\d{4})?)$")
        .expect("state/zip pattern is valid")
});

static CITY_STATE_ZIP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<city>.+?)\s+(?P<state>[A-Za-z]{2})\s+(?P<zip>\d{5}(?:-\d{4})?)$")
        .expect("city/state/zip pattern is valid")
});

/// Address parts recovered from free text. Values are raw, not normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub line: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// Splits `street, city, ST 12345` (commas or line breaks) into parts.
/// Text that does not follow that layout becomes the address line as a whole.
pub fn split_combined_address(text: &str) -> AddressParts {
    let segments: Vec<&str> = text
        .split(|c| c == '\n' || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let Some((line, rest)) = segments.split_first() else {
        return AddressParts::default();
    };
    let mut parts = AddressParts {
        line: Some(line.to_string()),
        ..Default::default()
    };
    let Some((tail, middle)) = rest.split_last() else {
        return parts;
    };

    if let Some(caps) = STATE_ZIP.captures(tail) {
        parts.state = Some(caps["state"].to_string());
        parts.zip = Some(caps["zip"].to_string());
        if !middle.is_empty() {
            parts.city = Some(middle.join(" "));
        }
    } else if let Some(caps) = CITY_STATE_ZIP.captures(tail) {
        parts.state = Some(caps["state"].to_string());
        parts.zip = Some(caps["zip"].to_string());
        let city = caps["city"].to_string();
        parts.city = Some(if middle.is_empty() {
            city
        } else {
            format!("{} {}", middle.join(" "), city)
        });
    } else if middle.is_empty() {
        parts.city = Some(tail.to_string());
    } else {
        parts.line = Some(segments.join(", "));
    }
    parts
}
