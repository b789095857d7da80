//! User accounts.
//!
//! A [`User`] is created once (admin tooling, the user API or a seed) and is
//! read-only from the point of view of authentication.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billjobs_core::{DomainError, DomainResult, FieldErrors, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Role flag carried by every account.
///
/// Authentication ignores it; billing uses it to let admins read every bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Member,
    Admin,
}

impl core::fmt::Display for UserRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserRole::Member => f.write_str("member"),
            UserRole::Admin => f.write_str("admin"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// Stored user account.
///
/// `password_hash` is an argon2 PHC string; it is skipped by serde so a
/// `User` can never leak it through a JSON response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A user ready to be persisted: validated, password already hashed, no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

impl UserRecord {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            is_active: self.is_active,
            date_joined: self.date_joined,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registration input
// ─────────────────────────────────────────────────────────────────────────────

pub const USERNAME_MAX_LEN: usize = 150;

const REQUIRED: &str = "This field is required.";
const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// Unvalidated registration request with a plaintext password.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, alias = "is_staff", deserialize_with = "role_from_wire")]
    pub role: UserRole,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: UserRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Check every field and return all problems at once.
    ///
    /// On success returns the trimmed username and the password as given.
    pub fn validate(&self) -> DomainResult<(String, String)> {
        let mut errors = FieldErrors::new();

        let username = self.username.as_deref().map(str::trim).unwrap_or_default();
        if username.is_empty() {
            errors.entry("username".into()).or_default().push(REQUIRED.into());
        } else if username.chars().count() > USERNAME_MAX_LEN
            || !username.chars().all(is_username_char)
        {
            errors.entry("username".into()).or_default().push(INVALID_USERNAME.into());
        }

        let password = self.password.as_deref().unwrap_or_default();
        if password.trim().is_empty() {
            errors.entry("password".into()).or_default().push(REQUIRED.into());
        }

        if let Some(email) = self.email.as_deref().map(str::trim) {
            if !email.is_empty() && !email.contains('@') {
                errors
                    .entry("email".into())
                    .or_default()
                    .push("Enter a valid email address.".into());
            }
        }

        if errors.is_empty() {
            Ok((username.to_string(), password.to_string()))
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    /// Build the storable record once the password has been hashed.
    pub fn into_record(
        self,
        username: String,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> UserRecord {
        UserRecord {
            username,
            password_hash,
            email: self.email.map(|e| e.trim().to_lowercase()).unwrap_or_default(),
            first_name: self.first_name.map(|s| s.trim().to_string()).unwrap_or_default(),
            last_name: self.last_name.map(|s| s.trim().to_string()).unwrap_or_default(),
            role: self.role,
            is_active: true,
            date_joined: now,
        }
    }
}

fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

/// Accepts either a role name (`"admin"`) or the boolean staff flag.
fn role_from_wire<'de, D>(deserializer: D) -> Result<UserRole, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Flag(bool),
        Text(String),
    }

    match Wire::deserialize(deserializer)? {
        Wire::Flag(true) => Ok(UserRole::Admin),
        Wire::Flag(false) => Ok(UserRole::Member),
        Wire::Text(s) => match s.trim().to_lowercase().as_str() {
            "admin" | "true" | "on" | "1" => Ok(UserRole::Admin),
            "member" | "false" | "off" | "0" | "" => Ok(UserRole::Member),
            other => Err(serde::de::Error::custom(format!("unknown role '{other}'"))),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_registration_trims_username() {
        let new = NewUser::new("  alice ", "s3cret");
        let (username, password) = new.validate().unwrap();
        assert_eq!(username, "alice");
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let err = NewUser::default().validate().unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors["username"], vec![REQUIRED.to_string()]);
        assert_eq!(errors["password"], vec![REQUIRED.to_string()]);
    }

    #[test]
    fn username_charset_is_enforced() {
        let err = NewUser::new("bad name!", "pw").validate().unwrap_err();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors["username"][0].starts_with("Enter a valid username."));
        assert!(!errors.contains_key("password"));
    }

    #[test]
    fn blank_password_is_rejected() {
        assert!(NewUser::new("bob", "   ").validate().is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let err = NewUser::new("carol", "pw")
            .with_email("not-an-email")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("email"));
    }

    #[test]
    fn role_accepts_staff_flag_or_name() {
        let a: NewUser = serde_json::from_str(r#"{"username":"a","is_staff":true}"#).unwrap();
        assert_eq!(a.role, UserRole::Admin);

        let b: NewUser = serde_json::from_str(r#"{"username":"b","role":"member"}"#).unwrap();
        assert_eq!(b.role, UserRole::Member);

        let c: NewUser = serde_json::from_str(r#"{"username":"c"}"#).unwrap();
        assert_eq!(c.role, UserRole::Member);
    }

    #[test]
    fn serialized_user_hides_password_hash() {
        let user = NewUser::new("dave", "pw")
            .into_record("dave".into(), "$argon2id$secret".into(), Utc::now())
            .into_user(UserId::new(1));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["username"], "dave");
        assert_eq!(json["role"], "member");
        assert!(json.get("password_hash").is_none());
    }
}
