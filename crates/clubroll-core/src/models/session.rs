//! Session user model

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role granted at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// School-wide administrator
    Admin,
    /// Club advisor, scoped to one club
    Teacher,
    /// Homeroom teacher, scoped to one class
    ClassTeacher,
}

impl UserRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Teacher => "teacher",
            Self::ClassTeacher => "class_teacher",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logged-in user, persisted until logout.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub role: UserRole,
    /// Display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_club_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_class_name: Option<String>,
    /// Remote blob key; `None` means local-only mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_code: Option<String>,
}

impl User {
    #[must_use]
    pub fn sync_code(&self) -> Option<&str> {
        self.sync_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Only admin sessions with a sync code poll the remote periodically.
    #[must_use]
    pub fn polls_remote(&self) -> bool {
        self.is_admin() && self.sync_code().is_some()
    }
}

impl fmt::Debug for User {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("User")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("name", &self.name)
            .field("assigned_club_id", &self.assigned_club_id)
            .field("assigned_class_name", &self.assigned_class_name)
            .field(
                "sync_code",
                &self.sync_code.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin(sync_code: Option<&str>) -> User {
        User {
            username: "admin".to_string(),
            role: UserRole::Admin,
            name: "Administrator".to_string(),
            assigned_club_id: None,
            assigned_class_name: None,
            sync_code: sync_code.map(str::to_string),
        }
    }

    #[test]
    fn blank_sync_code_means_local_only() {
        assert_eq!(admin(Some("  ")).sync_code(), None);
        assert!(!admin(Some("  ")).polls_remote());
        assert_eq!(admin(Some(" SFJH ")).sync_code(), Some("SFJH"));
        assert!(admin(Some("SFJH")).polls_remote());
    }

    #[test]
    fn debug_redacts_sync_code() {
        let debug = format!("{:?}", admin(Some("secret-code")));
        assert!(!debug.contains("secret-code"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn role_uses_snake_case_on_the_wire() {
        let mut user = admin(None);
        user.role = UserRole::ClassTeacher;
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "class_teacher");
        assert!(json.get("syncCode").is_none());
    }
}
