//! Input normalization and validation for session operations.

use super::{
    errors::{AuthError, AuthResult, FieldError},
    models::{RegisterRequest, UpdateProfileRequest},
};

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_BIO_LEN: usize = 500;
const MAX_EMAIL_LEN: usize = 255;

/// Canonical form of an email address: trimmed and lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose syntactic check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Validate a registration request.
pub fn validate_registration(request: &RegisterRequest) -> AuthResult<()> {
    let mut errors = Vec::new();

    check_name(&request.name, &mut errors);

    if request.email.trim().is_empty() {
        errors.push(FieldError::new("email", "This field is required"));
    } else if !is_valid_email(&normalize_email(&request.email)) {
        errors.push(FieldError::new("email", "Must be a valid email address"));
    }

    if request.password.is_empty() {
        errors.push(FieldError::new("password", "This field is required"));
    } else if request.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("Must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }

    finish(errors)
}

/// Validate a login request. Only presence is checked; anything stricter
/// would tell a caller more than "invalid email or password".
pub fn validate_login(email: &str, password: &str) -> AuthResult<()> {
    let mut errors = Vec::new();
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "This field is required"));
    }
    if password.is_empty() {
        errors.push(FieldError::new("password", "This field is required"));
    }
    finish(errors)
}

/// Validate a profile update.
pub fn validate_profile_update(request: &UpdateProfileRequest) -> AuthResult<()> {
    let mut errors = Vec::new();

    if let Some(name) = &request.name {
        check_name(name, &mut errors);
    }
    if let Some(bio) = &request.bio {
        if bio.chars().count() > MAX_BIO_LEN {
            errors.push(FieldError::new(
                "bio",
                format!("Must be at most {MAX_BIO_LEN} characters long"),
            ));
        }
    }

    finish(errors)
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let len = name.trim().chars().count();
    if len == 0 {
        errors.push(FieldError::new("name", "This field is required"));
    } else if len < MIN_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Must be at least {MIN_NAME_LEN} characters long"),
        ));
    } else if len > MAX_NAME_LEN {
        errors.push(FieldError::new(
            "name",
            format!("Must be at most {MAX_NAME_LEN} characters long"),
        ));
    }
}

fn finish(errors: Vec<FieldError>) -> AuthResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration(&register("Ann", "ann@x.com", "password123")).is_ok());
    }

    #[test]
    fn test_registration_collects_every_field() {
        let err = validate_registration(&register("A", "not-an-email", "short")).unwrap_err();
        let fields: Vec<_> = err
            .details()
            .unwrap()
            .iter()
            .map(|f| f.field.as_str())
            .collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("ann@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("ann@"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("ann@@x.com"));
        assert!(!is_valid_email("an n@x.com"));
        assert!(!is_valid_email("ann@x..com"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@X.COM "), "ann@x.com");
    }

    #[test]
    fn test_bio_too_long() {
        let request = UpdateProfileRequest {
            name: None,
            bio: Some("x".repeat(MAX_BIO_LEN + 1)),
        };
        assert!(validate_profile_update(&request).is_err());
        assert!(validate_profile_update(&UpdateProfileRequest::default()).is_ok());
    }

    #[test]
    fn test_login_only_checks_presence() {
        assert!(validate_login("whatever", "x").is_ok());
        assert!(validate_login("", "").is_err());
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(email in "[ A-Za-z0-9@._+-]{0,40}") {
            let once = normalize_email(&email);
            prop_assert_eq!(normalize_email(&once), once.clone());
            prop_assert_eq!(once.to_lowercase(), once);
        }

        #[test]
        fn case_variants_normalize_equal(local in "[a-z0-9]{1,12}", domain in "[a-z]{1,10}") {
            let lower = format!("{local}@{domain}.com");
            let upper = lower.to_uppercase();
            prop_assert_eq!(normalize_email(&lower), normalize_email(&upper));
        }
    }
}
