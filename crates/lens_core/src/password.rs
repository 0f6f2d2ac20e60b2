//! crates/lens_core/src/password.rs
//!
//! Client-side password policy, checked before any call to the identity provider.

/// Characters that satisfy the "one special character" rule.
pub const PASSWORD_SYMBOLS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Shown next to the password field whenever the policy rejects a password.
pub const PASSWORD_REQUIREMENTS: &str = "Password must be at least 8 characters, include one uppercase letter, one number, and one special character.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least 8 characters")]
    TooShort,
    #[error("Password must include an uppercase letter")]
    MissingUppercase,
    #[error("Password must include a number")]
    MissingDigit,
    #[error("Password must include a special character")]
    MissingSymbol,
}

/// Checks a password against the policy, reporting the first rule it breaks.
pub fn check_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordPolicyError::MissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(PasswordPolicyError::MissingSymbol);
    }
    Ok(())
}
