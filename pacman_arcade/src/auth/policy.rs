//! Username, email and password rules applied before any write.

use crate::validation::ValidationErrors;

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;

pub const USERNAME_FORMAT: &str =
    "Username must be 3-20 characters and contain only letters, numbers, and underscores.";
pub const USERNAME_TAKEN: &str = "A user with this username already exists.";
pub const EMAIL_FORMAT: &str = "Enter a valid email address.";
pub const EMAIL_TAKEN: &str = "A user with this email already exists.";
pub const PASSWORD_MISMATCH: &str = "Password fields did not match.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_NUMERIC: &str = "This password is entirely numeric.";
pub const PASSWORD_COMMON: &str = "This password is too common.";
pub const PASSWORD_SIMILAR_USERNAME: &str = "The password is too similar to the username.";
pub const PASSWORD_SIMILAR_EMAIL: &str = "The password is too similar to the email address.";

/// Frequently breached passwords that pass the length rule.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwertyuiop", "qwerty123", "iloveyou", "sunshine", "princess", "football",
    "baseball", "welcome1", "abc12345", "trustno1", "superman", "starwars",
    "letmein1", "whatever", "passw0rd", "11111111", "00000000", "dragon12",
    "pacman123", "pacmanpacman", "gameover", "arcade123",
];

/// Check username shape: `^[A-Za-z0-9_]{3,20}$`
pub fn validate_username(username: &str) -> Result<(), ValidationErrors> {
    let len = username.chars().count();
    let well_formed = (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len)
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(ValidationErrors::single("username", USERNAME_FORMAT))
    }
}

/// Loose structural email check: one `@`, non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), ValidationErrors> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split('.')
                    .all(|label| !label.is_empty() && !label.starts_with('-'))
                && domain.contains('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationErrors::single("email", EMAIL_FORMAT))
    }
}

/// Password strength rules. Every failing rule contributes a message.
pub fn validate_password(
    password: &str,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let lowered = password.to_lowercase();

    if password.chars().count() < PASSWORD_MIN_LEN {
        errors.add("password", PASSWORD_TOO_SHORT);
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        errors.add("password", PASSWORD_NUMERIC);
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        errors.add("password", PASSWORD_COMMON);
    }
    if let Some(username) = username {
        if too_similar(&lowered, &username.to_lowercase()) {
            errors.add("password", PASSWORD_SIMILAR_USERNAME);
        }
    }
    if let Some(local) = email.and_then(|e| e.split('@').next()) {
        if too_similar(&lowered, &local.to_lowercase()) {
            errors.add("password", PASSWORD_SIMILAR_EMAIL);
        }
    }

    errors.into_result()
}

/// A password counts as similar when one contains the other and the shorter
/// covers most of the longer.
fn too_similar(password: &str, attribute: &str) -> bool {
    if password.is_empty() || attribute.len() < USERNAME_MIN_LEN {
        return false;
    }
    let (short, long) = if password.len() <= attribute.len() {
        (password, attribute)
    } else {
        (attribute, password)
    };
    long.contains(short) && short.len() * 10 >= long.len() * 7
}
