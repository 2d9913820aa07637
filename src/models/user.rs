// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Account type. Decides which half of the platform a user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Company,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Company => "company",
            Role::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "student" => Some(Role::Student),
            "company" => Some(Role::Company),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Unique contact email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// 'student', 'company' or 'admin'.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new account (Registration).
///
/// Companies must supply `company_name`; students may supply `full_name`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
    /// Only 'student' and 'company' can self-register.
    pub role: Role,
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub company_name: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Student, Role::Company, Role::Admin] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn register_request_validation() {
        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "maria",
            "email": "not-an-email",
            "password": "password123",
            "role": "student"
        }))
        .unwrap();
        assert!(req.validate().is_err());

        let req: RegisterRequest = serde_json::from_value(serde_json::json!({
            "username": "maria",
            "email": "maria@example.com",
            "password": "password123",
            "role": "student"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
    }
}
