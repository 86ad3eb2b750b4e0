//! Local registration pre-checks. The first failing field wins.

use crate::error::ValidationError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;

/// Checks all registration fields in form order: email, username, password.
///
/// # Errors
/// Returns the first field that fails its rule.
pub fn validate_registration(
    email: &str,
    username: &str,
    password: &str,
) -> Result<(), ValidationError> {
    validate_email(email)?;
    validate_username(username)?;
    validate_password(password)
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain.
///
/// # Errors
/// Returns a validation error for the `email` field.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("email", "Please enter a valid email address");

    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let Some((name, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if name.is_empty() || tld.is_empty() || name.ends_with('.') {
        return Err(invalid());
    }
    Ok(())
}

/// 3-20 characters of ASCII letters, digits, `_`, `.` or `-`.
///
/// # Errors
/// Returns a validation error for the `username` field.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationError::new(
            "username",
            format!("Username must be {USERNAME_MIN}-{USERNAME_MAX} characters"),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ValidationError::new(
            "username",
            "Username may only contain letters, digits, '_', '.' and '-'",
        ));
    }
    Ok(())
}

/// At least 8 characters with at least one letter and one digit.
///
/// # Errors
/// Returns a validation error for the `password` field.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(ValidationError::new(
            "password",
            format!("Password must be at least {PASSWORD_MIN} characters"),
        ));
    }
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}
