//! Client-side validation for the registration form
//!
//! Runs before any network call so that obviously broken input never reaches the backend.

use crate::core::auth::RegisterRequest;

/// Maximum length for usernames
pub const MAX_USERNAME_LENGTH: usize = 150;

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is empty
    Required { field: &'static str },
    /// Email is not of the form `local@domain.tld`
    InvalidEmail,
    /// Username is too long
    UsernameTooLong { max: usize, actual: usize },
    /// Password and confirmation differ
    PasswordMismatch,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required { field } => write!(f, "{} is required", field),
            ValidationError::InvalidEmail => write!(f, "Please enter a valid email"),
            ValidationError::UsernameTooLong { max, actual } => {
                write!(f, "Username is too long ({} chars, max {})", actual, max)
            }
            ValidationError::PasswordMismatch => write!(f, "Passwords do not match"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validation result collecting every problem found in a form
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Convert to Result, returning first error if any
    pub fn to_result(&self) -> Result<(), ValidationError> {
        match self.errors.first() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Check the `local@domain.tld` shape of an email address
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|part| !part.is_empty())
}

/// Validate a registration form. Password confirmation is checked last so the
/// mismatch is reported even when other fields are fine.
pub fn validate_registration(form: &RegisterRequest) -> ValidationResult {
    let mut result = ValidationResult::new();

    let required = [
        ("First name", &form.first_name),
        ("Last name", &form.last_name),
        ("Username", &form.username),
        ("Email", &form.email),
        ("Password", &form.password),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            result.add_error(ValidationError::Required { field });
        }
    }

    if !form.email.trim().is_empty() && !is_valid_email(form.email.trim()) {
        result.add_error(ValidationError::InvalidEmail);
    }

    let username_len = form.username.trim().chars().count();
    if username_len > MAX_USERNAME_LENGTH {
        result.add_error(ValidationError::UsernameTooLong {
            max: MAX_USERNAME_LENGTH,
            actual: username_len,
        });
    }

    if form.password != form.password2 {
        result.add_error(ValidationError::PasswordMismatch);
    }

    result
}
