//! Password hashing via bcrypt, plus the strength policy.

use super::AuthError;

/// bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Minimum password length accepted by `hash_password`.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Maximum password length accepted by the strength policy.
pub const MAX_PASSWORD_LEN: usize = 128;

/// Passwords rejected outright regardless of character classes.
/// Compared lowercased.
const COMMON_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "12345678",
    "123456789",
    "qwerty123",
    "letmein1",
    "iloveyou",
    "admin123",
    "welcome1",
];

/// Hash a password with bcrypt. The output encodes salt and cost, so
/// verification needs no side channel.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(vec![format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )]));
    }
    bcrypt::hash(password, cost).map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// Returns `false` for empty or malformed input rather than erroring, so
/// login code has exactly one failure path for bad credentials.
pub fn verify_password(password: &str, hash: &str) -> bool {
    if password.is_empty() || hash.is_empty() {
        return false;
    }
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Check a candidate password against the strength policy.
///
/// Returns every violated rule as a human-readable message (empty = ok),
/// so callers can show all violations at once instead of one per attempt.
pub fn check_strength(password: &str) -> Vec<String> {
    let mut reasons = Vec::new();

    // Length is in characters, not bytes, so a multibyte password is not
    // counted longer than what the user actually typed.
    let char_count = password.chars().count();
    if char_count < MIN_PASSWORD_LEN {
        reasons.push(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    if char_count > MAX_PASSWORD_LEN {
        reasons.push(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        reasons.push("Password must contain a lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        reasons.push("Password must contain an uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        reasons.push("Password must contain a digit".to_string());
    }
    if !password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !c.is_whitespace())
    {
        reasons.push("Password must contain a special character".to_string());
    }
    if COMMON_PASSWORDS.contains(&password.to_ascii_lowercase().as_str()) {
        reasons.push("Password is too common".to_string());
    }

    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    // Low cost keeps the test suite fast; production uses DEFAULT_BCRYPT_COST.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_round_trips() {
        let hash = hash_password("Abc12345!", TEST_COST).unwrap();
        assert_ne!(hash, "Abc12345!");
        assert!(verify_password("Abc12345!", &hash));
        assert!(!verify_password("Abc12345?", &hash));
    }

    #[test]
    fn hash_rejects_short_input() {
        let err = hash_password("short", TEST_COST).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn verify_is_false_for_empty_or_malformed() {
        assert!(!verify_password("", "$2b$04$whatever"));
        assert!(!verify_password("Abc12345!", ""));
        assert!(!verify_password("Abc12345!", "not-a-bcrypt-hash"));
    }

    #[test]
    fn strength_accepts_good_password() {
        assert!(check_strength("Abc12345!").is_empty());
    }

    #[test]
    fn strength_reports_each_missing_class() {
        let reasons = check_strength("abcdefgh");
        assert!(reasons.iter().any(|r| r.contains("uppercase")));
        assert!(reasons.iter().any(|r| r.contains("digit")));
        assert!(reasons.iter().any(|r| r.contains("special")));
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn strength_accumulates_length_and_classes() {
        let reasons = check_strength("ab1");
        assert!(reasons.iter().any(|r| r.contains("at least 8")));
        assert!(reasons.iter().any(|r| r.contains("uppercase")));
        assert!(reasons.iter().any(|r| r.contains("special")));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Six characters but eight UTF-8 bytes; still too short.
        let reasons = check_strength("Aa1!ññ");
        assert!(reasons.iter().any(|r| r.contains("at least 8")));
        let err = hash_password("Aa1!ññ", TEST_COST).unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[test]
    fn strength_rejects_overlong() {
        let long = "Aa1!".repeat(40);
        let reasons = check_strength(&long);
        assert!(reasons.iter().any(|r| r.contains("at most 128")));
    }

    #[test]
    fn strength_rejects_common_passwords() {
        let reasons = check_strength("Password123");
        assert!(reasons.iter().any(|r| r.contains("too common")));
    }
}
