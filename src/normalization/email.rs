// src/normalization/email.rs

/// Trimmed and lowercased. Anything without a `local@domain` shape is empty.
pub fn normalize_email(email: &str) -> String {
    let email_trimmed = email.trim().to_lowercase();
    let Some((local_part, domain_part)) = email_trimmed.split_once('@') else {
        return String::new();
    };
    if local_part.is_empty()
        || domain_part.is_empty()
        || domain_part.contains('@')
        || email_trimmed.contains(char::is_whitespace)
    {
        return String::new();
    }
    email_trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  John.Doe@Example.COM "), "john.doe@example.com");
        assert_eq!(normalize_email("no-at-sign"), "");
        assert_eq!(normalize_email("@example.com"), "");
        assert_eq!(normalize_email("a@b@c"), "");
        assert_eq!(normalize_email("john doe@example.com"), "");
    }
}
