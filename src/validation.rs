use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("regex compiles")
});

const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Client name must be between 2 and 50 characters")]
    InvalidClientName,
}

/// Returns the trimmed address when it is well formed.
pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let email = value.trim();
    let well_formed = email.len() <= MAX_EMAIL_LEN
        && EMAIL_REGEX.is_match(email)
        && email
            .split_once('@')
            .is_some_and(|(local, _)| valid_local_part(local));

    if well_formed {
        Ok(email.to_string())
    } else {
        Err(ValidationError::InvalidEmail(value.to_string()))
    }
}

fn valid_local_part(local: &str) -> bool {
    local.len() <= 64 && !local.starts_with('.') && !local.ends_with('.') && !local.contains("..")
}

pub fn validate_client_name(value: &str) -> Result<String, ValidationError> {
    let name = value.trim();
    if (2..=50).contains(&name.chars().count()) {
        Ok(name.to_string())
    } else {
        Err(ValidationError::InvalidClientName)
    }
}
