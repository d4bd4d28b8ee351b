// Validation utilities module
// Custom validation functions for account-specific rules

use validator::ValidationError;

/// Validates password strength requirements
/// At least 8 characters with one uppercase, one lowercase, one digit and
/// one special character
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.len() < 8 {
        let mut err = ValidationError::new("password_too_short");
        err.message = Some("password must be at least 8 characters".into());
        return Err(err);
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if has_upper && has_lower && has_digit && has_special {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_too_weak");
        err.message =
            Some("password must contain uppercase, lowercase, digit and special character".into());
        Err(err)
    }
}

/// Validates that a role string is a member of the hierarchy
pub fn validate_role_member(role: &str) -> Result<(), ValidationError> {
    match crate::auth::role::Role::parse(role) {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("invalid_role")),
    }
}
