//! Login and registration form checks, run before any request is sent.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::types::NewUser;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));
static UPPERCASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("uppercase pattern compiles"));
static DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("digit pattern compiles"));
static SPECIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("special pattern compiles"));

pub const LOGIN_MIN_PASSWORD: usize = 6;
pub const REGISTER_MIN_PASSWORD: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[derive(Clone, Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Every failing field, in form order. Empty means the form can be sent.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !is_valid_email(email) {
            errors.push(FieldError::new("email", "Please enter a valid email address"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        } else if self.password.chars().count() < LOGIN_MIN_PASSWORD {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 6 characters",
            ));
        }
        errors
    }
}

#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

impl RegisterForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Name is required"));
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError::new("email", "Please enter a valid email"));
        }
        if self.password.chars().count() < REGISTER_MIN_PASSWORD {
            errors.push(FieldError::new(
                "password",
                "Password must be at least 8 characters",
            ));
        }
        if self.confirm_password != self.password {
            errors.push(FieldError::new("confirm_password", "Passwords do not match"));
        }
        if !self.accept_terms {
            errors.push(FieldError::new(
                "accept_terms",
                "You must accept the terms and conditions",
            ));
        }
        errors
    }

    /// Account creation body for a form that passed [`RegisterForm::validate`].
    pub fn to_new_user(&self, role_id: impl Into<String>) -> NewUser {
        NewUser {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role_id: role_id.into(),
            profile: Some(json!({ "name": self.name.trim() })),
        }
    }
}

/// Requirement labels shown under the password field, with their check.
pub const PASSWORD_REQUIREMENTS: [(&str, fn(&str) -> bool); 4] = [
    ("At least 8 characters", |pwd| pwd.chars().count() >= REGISTER_MIN_PASSWORD),
    ("Contains uppercase letter", |pwd| UPPERCASE_RE.is_match(pwd)),
    ("Contains number", |pwd| DIGIT_RE.is_match(pwd)),
    ("Contains special character", |pwd| SPECIAL_RE.is_match(pwd)),
];

/// Number of satisfied requirements, 0 to 4.
pub fn password_strength(password: &str) -> u8 {
    PASSWORD_REQUIREMENTS
        .iter()
        .filter(|(_, check)| check(password))
        .count() as u8
}

pub fn strength_label(strength: u8) -> &'static str {
    match strength {
        0 => "empty",
        1 => "weak",
        2 => "fair",
        3 => "good",
        _ => "strong",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("prof@lycee.fr"));
        assert!(!is_valid_email("prof@lycee"));
        assert!(!is_valid_email("prof lycee@x.fr"));
        assert!(!is_valid_email("@x.fr"));
    }

    #[test]
    fn login_reports_each_field_once() {
        let form = LoginForm::default();
        assert_eq!(fields(&form.validate()), vec!["email", "password"]);

        let form = LoginForm {
            email: "prof@lycee.fr".into(),
            password: "12345".into(),
        };
        let errors = form.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Password must be at least 6 characters");

        let form = LoginForm {
            email: " prof@lycee.fr ".into(),
            password: "123456".into(),
        };
        assert!(form.validate().is_empty());
    }

    #[test]
    fn register_checks_every_rule() {
        let form = RegisterForm {
            name: " ".into(),
            email: "nope".into(),
            password: "short".into(),
            confirm_password: "other".into(),
            accept_terms: false,
        };
        assert_eq!(
            fields(&form.validate()),
            vec!["name", "email", "password", "confirm_password", "accept_terms"]
        );

        let form = RegisterForm {
            name: "Marie".into(),
            email: "marie@lycee.fr".into(),
            password: "Radium#1898".into(),
            confirm_password: "Radium#1898".into(),
            accept_terms: true,
        };
        assert!(form.validate().is_empty());

        let body = serde_json::to_value(form.to_new_user("role-instructor")).unwrap();
        assert_eq!(body["email"], "marie@lycee.fr");
        assert_eq!(body["role_id"], "role-instructor");
        assert_eq!(body["profile"]["name"], "Marie");
    }

    #[test]
    fn strength_counts_requirements() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abcdefgh"), 1);
        assert_eq!(password_strength("Abcdefgh"), 2);
        assert_eq!(password_strength("Abcdefg1"), 3);
        assert_eq!(password_strength("Abcdef1!"), 4);
        assert_eq!(password_strength("A1!"), 3);
        assert_eq!(strength_label(4), "strong");
    }
}
