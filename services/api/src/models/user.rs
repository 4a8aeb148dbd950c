//! User model and related functionality

use std::fmt;

use serde::Serialize;
use sqlx::FromRow;

/// Row shape of the user lookup joining `sys_user`, `employee` and `emp_profile`
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: i64,
    pub role: Option<i64>,
    pub user_password: Option<String>,
}

/// User as known to the service, with the role id already obfuscated
#[derive(Clone)]
pub struct UserRecord {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
    /// Obfuscated role id, empty when the account has no role
    pub role: String,
    /// Server-side hash; never serialized
    pub password_hash: Option<String>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .field("disabled", &self.disabled)
            .field("role", &self.role)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl UserRecord {
    /// Public view of the user, without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            disabled: self.disabled,
            role: self.role.clone(),
        }
    }
}

/// Public user profile; also the authenticated principal handed to handlers
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserProfile {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub disabled: bool,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            username: "budi".to_string(),
            full_name: Some("Budi Santoso".to_string()),
            email: Some("budi@example.com".to_string()),
            disabled: false,
            role: "Xk2pQ9aLm3".to_string(),
            password_hash: Some("*2470C0C06DEE42FD1618BB99005ADCA2EC9D1E19".to_string()),
        }
    }

    #[test]
    fn test_debug_redacts_password_hash() {
        let rendered = format!("{:?}", record());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("2470C0C0"));
    }

    #[test]
    fn test_profile_omits_password() {
        let json = serde_json::to_value(record().profile()).unwrap();
        assert_eq!(json["username"], "budi");
        assert_eq!(json["role"], "Xk2pQ9aLm3");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("user_password").is_none());
    }
}
