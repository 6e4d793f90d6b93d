//! Password complexity policy for new passwords.

use vocalis_core::error::AppError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validates password strength at the request boundary.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    max_length: usize,
}

impl PasswordValidator {
    /// Creates a validator with the standard length bounds.
    pub fn new() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
        }
    }

    /// Lists every rule the password violates.
    pub fn violations(&self, password: &str) -> Vec<String> {
        let mut violations = Vec::new();
        let length = password.chars().count();

        if length < self.min_length {
            violations.push(format!(
                "Password must be at least {} characters long",
                self.min_length
            ));
        }
        if length > self.max_length {
            violations.push(format!(
                "Password must be at most {} characters long",
                self.max_length
            ));
        }
        if !password.chars().any(char::is_uppercase) {
            violations.push("Password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(char::is_lowercase) {
            violations.push("Password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push("Password must contain at least one digit".to_string());
        }
        if !password
            .chars()
            .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
        {
            violations.push("Password must contain at least one special character".to_string());
        }

        violations
    }

    /// Validates a password against all rules.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        let violations = self.violations(password);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(violations.join("; ")))
        }
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

impl Default for PasswordValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vocalis_core::error::ErrorKind;

    #[test]
    fn accepts_complex_password() {
        assert!(PasswordValidator::new().validate("Alice#2024").is_ok());
    }

    #[test]
    fn reports_each_missing_class() {
        let validator = PasswordValidator::new();
        assert_eq!(validator.violations("alllowercase1!").len(), 1);
        assert_eq!(validator.violations("ALLUPPERCASE1!").len(), 1);
        assert_eq!(validator.violations("NoDigitsHere!").len(), 1);
        assert_eq!(validator.violations("NoSymbols123").len(), 1);
        assert_eq!(validator.violations("Aa1!").len(), 1);
        assert_eq!(validator.violations("").len(), 5);
    }

    #[test]
    fn whitespace_is_not_a_symbol() {
        let violations = PasswordValidator::new().violations("Has Space 123");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("special"));
    }

    #[test]
    fn rejects_overlong_password() {
        let long = format!("Aa1!{}", "x".repeat(MAX_PASSWORD_LENGTH));
        let err = PasswordValidator::new().validate(&long).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("at most"));
    }

    #[test]
    fn new_password_must_differ() {
        let validator = PasswordValidator::new();
        assert!(validator.validate_not_same("Old#Pass1", "Old#Pass1").is_err());
        assert!(validator.validate_not_same("Old#Pass1", "New#Pass1").is_ok());
    }
}
