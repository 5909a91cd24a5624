use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::User;

/// Public part of a user returned to clients.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            full_name: u.full_name,
            is_admin: u.is_admin,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Body for registration and admin user creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Body for self-service and admin profile updates.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl CreateUserRequest {
    /// Field-level validation; the message names the offending field.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if !is_valid_email(&self.email) {
            return Err("Invalid email".into());
        }
        if self.password.len() < 6 || self.password.len() > 100 {
            return Err("Password must be 6-100 characters".into());
        }
        if self.full_name.is_empty() || self.full_name.len() > 100 {
            return Err("Full name must be 1-100 characters".into());
        }
        Ok(())
    }
}

impl UpdateUserRequest {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err("Invalid email".into());
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 6 || password.len() > 100 {
                return Err("Password must be 6-100 characters".into());
            }
        }
        if let Some(full_name) = &self.full_name {
            if full_name.is_empty() || full_name.len() > 100 {
                return Err("Full name must be 1-100 characters".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn create_request_bounds() {
        let req = CreateUserRequest {
            email: "user@example.com".into(),
            password: "secret1".into(),
            full_name: "A User".into(),
            is_admin: false,
        };
        assert!(req.validate().is_ok());

        let short = CreateUserRequest {
            password: "short".into(),
            email: "user@example.com".into(),
            full_name: "A User".into(),
            is_admin: false,
        };
        assert_eq!(
            short.validate().unwrap_err(),
            "Password must be 6-100 characters"
        );

        let nameless = CreateUserRequest {
            full_name: String::new(),
            email: "user@example.com".into(),
            password: "secret1".into(),
            is_admin: false,
        };
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn update_request_skips_absent_fields() {
        let empty = UpdateUserRequest {
            email: None,
            full_name: None,
            password: None,
        };
        assert!(empty.validate().is_ok());

        let bad_email = UpdateUserRequest {
            email: Some("nope".into()),
            full_name: None,
            password: None,
        };
        assert_eq!(bad_email.validate().unwrap_err(), "Invalid email");
    }
}
