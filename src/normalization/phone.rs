// src/normalization/phone.rs
use log::debug;

const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Digits only. A leading US country code on an 11-digit number is dropped;
/// fewer than 7 or more than 15 digits normalizes to empty.
pub fn normalize_phone(phone: &str) -> String {
    let digits_only: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits_only.len() == 11 && digits_only.starts_with('1') {
        return digits_only[1..].to_string();
    }
    if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits_only.len()) {
        return digits_only;
    }
    debug!(
        "Phone number '{}' normalized to '{}', considered invalid for matching.",
        phone, digits_only
    );
    String::new()
}
