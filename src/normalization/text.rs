// src/normalization/text.rs

/// Trims, lowercases and collapses internal whitespace to single spaces.
pub fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Insurance and policy numbers compare on lowercase alphanumerics only.
pub fn normalize_insurance_id(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First five digits of a US ZIP / ZIP+4; empty when fewer than five digits.
pub fn normalize_zip(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 5 {
        return String::new();
    }
    digits[..5].to_string()
}

const US_STATES: [(&str, &str); 51] = [
    ("alabama", "al"), ("alaska", "ak"), ("arizona", "az"), ("arkansas", "ar"),
    ("california", "ca"), ("colorado", "co"), ("connecticut", "ct"), ("delaware", "de"),
    ("district of columbia", "dc"), ("florida", "fl"), ("georgia", "ga"), ("hawaii", "hi"),
    ("idaho", "id"), ("illinois", "il"), ("indiana", "in"), ("iowa", "ia"),
    ("kansas", "ks"), ("kentucky", "ky"), ("louisiana", "la"), ("maine", "me"),
    ("maryland", "md"), ("massachusetts", "ma"), ("michigan", "mi"), ("minnesota", "mn"),
    ("mississippi", "ms"), ("missouri", "mo"), ("montana", "mt"), ("nebraska", "ne"),
    ("nevada", "nv"), ("new hampshire", "nh"), ("new jersey", "nj"), ("new mexico", "nm"),
    ("new york", "ny"), ("north carolina", "nc"), ("north dakota", "nd"), ("ohio", "oh"),
    ("oklahoma", "ok"), ("oregon", "or"), ("pennsylvania", "pa"), ("rhode island", "ri"),
    ("south carolina", "sc"), ("south dakota", "sd"), ("tennessee", "tn"), ("texas", "tx"),
    ("utah", "ut"), ("vermont", "vt"), ("virginia", "va"), ("washington", "wa"),
    ("west virginia", "wv"), ("wisconsin", "wi"), ("wyoming", "wy"),
];

/// Two-letter lowercase state code. Full US state names are mapped to their
/// code; anything else that is not two letters normalizes to empty.
pub fn normalize_state(value: &str) -> String {
    let normalized = normalize_text(value);
    let letters: String = normalized
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.len() == 2 {
        return letters;
    }
    US_STATES
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, code)| code.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_whitespace_and_case() {
        assert_eq!(normalize_text("  JOHN   Paul\t"), "john paul");
        assert_eq!(normalize_text("john paul"), "john paul");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_insurance_id() {
        assert_eq!(normalize_insurance_id("INS-123 ab"), "ins123ab");
        assert_eq!(normalize_insurance_id("--"), "");
    }

    #[test]
    fn test_normalize_zip() {
        assert_eq!(normalize_zip("62701"), "62701");
        assert_eq!(normalize_zip("62701-1234"), "62701");
        assert_eq!(normalize_zip("627"), "");
    }

    #[test]
    fn test_normalize_state() {
        assert_eq!(normalize_state("IL"), "il");
        assert_eq!(normalize_state(" New  York "), "ny");
        assert_eq!(normalize_state("Atlantis"), "");
    }
}
