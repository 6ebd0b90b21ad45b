//! Text rules shared by the account and catalog services.

use regex::Regex;
use std::sync::OnceLock;

const MAX_INPUT_CHARS: usize = 1000;

const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "123456",
    "123456789",
    "qwerty",
    "abc123",
    "password123",
    "admin",
    "letmein",
    "welcome",
    "monkey",
];

/// Trims, drops `<script>` blocks and angle brackets, and caps the length.
#[must_use]
pub fn sanitize_input(input: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let script = RE.get_or_init(|| {
        Regex::new(r"(?is)<script\b[^<]*(?:<[^<]*)*?</script>").expect("Invalid regex")
    });

    let without_scripts = script.replace_all(input.trim(), "");
    without_scripts
        .chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(MAX_INPUT_CHARS)
        .collect()
}

/// Checks length, character classes and a list of common passwords.
pub fn validate_strong_password(password: &str, min_length: usize) -> Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {min_length} characters"
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit".to_string());
    }

    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        return Err("Password is too common".to_string());
    }

    Ok(())
}

/// `Some(trimmed)` for non-blank input, `None` otherwise.
#[must_use]
pub fn trim_to_option(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_markup() {
        assert_eq!(sanitize_input("  alice  "), "alice");
        assert_eq!(
            sanitize_input("bob<script>alert('x')</script>"),
            "bob"
        );
        assert_eq!(sanitize_input("<b>carol</b>"), "bcarol/b");
        assert_eq!(sanitize_input(&"a".repeat(1500)).len(), 1000);
    }

    #[test]
    fn test_strong_password_rules() {
        assert!(validate_strong_password("Secret123", 8).is_ok());
        assert!(validate_strong_password("Sh0rt", 8).is_err());
        assert!(validate_strong_password("alllower123", 8).is_err());
        assert!(validate_strong_password("ALLUPPER123", 8).is_err());
        assert!(validate_strong_password("NoDigitsHere", 8).is_err());
        assert_eq!(
            validate_strong_password("Password123", 8),
            Err("Password is too common".to_string())
        );
    }

    #[test]
    fn test_trim_to_option() {
        assert_eq!(trim_to_option(Some("  x ")), Some("x".to_string()));
        assert_eq!(trim_to_option(Some("   ")), None);
        assert_eq!(trim_to_option(None), None);
    }
}
