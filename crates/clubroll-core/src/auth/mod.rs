//! Built-in credential check.
//!
//! There is no account backend: the school's accounts are fixed patterns.
//! `admin/admin123` is the administrator, `t{N}/club123` the teacher of club
//! `N`, and `c{NNN}/class123` the class teacher of class `NNN`.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::{User, UserRole};
use crate::util::normalize_text_option;
use crate::{Error, Result};

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";
const TEACHER_PASSWORD: &str = "club123";
const CLASS_TEACHER_PASSWORD: &str = "class123";

fn teacher_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^t(\d+)$").expect("Invalid regex"))
}

fn class_teacher_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^c(\d{3})$").expect("Invalid regex"))
}

/// Resolve a login attempt into a session user.
///
/// Usernames are case-insensitive. A blank `sync_code` means local-only.
pub fn authenticate(username: &str, password: &str, sync_code: Option<&str>) -> Result<User> {
    let username = username.trim().to_lowercase();
    let sync_code = normalize_text_option(sync_code.map(str::to_string));

    let (role, name, assigned_club_id, assigned_class_name) = if username == ADMIN_USERNAME {
        if password != ADMIN_PASSWORD {
            return Err(Error::InvalidCredentials);
        }
        (UserRole::Admin, "Academic Affairs Administrator".to_string(), None, None)
    } else if let Some(captures) = teacher_pattern().captures(&username) {
        if password != TEACHER_PASSWORD {
            return Err(Error::InvalidCredentials);
        }
        let club_id = captures[1].to_string();
        (
            UserRole::Teacher,
            format!("Club teacher (T{club_id})"),
            Some(club_id),
            None,
        )
    } else if let Some(captures) = class_teacher_pattern().captures(&username) {
        if password != CLASS_TEACHER_PASSWORD {
            return Err(Error::InvalidCredentials);
        }
        let class_name = captures[1].to_string();
        (
            UserRole::ClassTeacher,
            format!("Class teacher ({class_name})"),
            None,
            Some(class_name),
        )
    } else {
        return Err(Error::InvalidCredentials);
    };

    Ok(User {
        username,
        role,
        name,
        assigned_club_id,
        assigned_class_name,
        sync_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn admin_login() {
        let user = authenticate("Admin", "admin123", Some(" SFJH-2025 ")).unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.sync_code(), Some("SFJH-2025"));
        assert!(user.polls_remote());
    }

    #[test]
    fn teacher_login_assigns_club() {
        let user = authenticate("T12", "club123", None).unwrap();
        assert_eq!(user.role, UserRole::Teacher);
        assert_eq!(user.assigned_club_id.as_deref(), Some("12"));
        assert_eq!(user.name, "Club teacher (T12)");
        assert_eq!(user.sync_code, None);
        assert!(!user.polls_remote());
    }

    #[test]
    fn class_teacher_login_assigns_class() {
        let user = authenticate("c701", "class123", Some("   ")).unwrap();
        assert_eq!(user.role, UserRole::ClassTeacher);
        assert_eq!(user.assigned_class_name.as_deref(), Some("701"));
        assert_eq!(user.sync_code, None);
    }

    #[test]
    fn wrong_password_or_unknown_user_is_rejected() {
        for (username, password) in [
            ("admin", "club123"),
            ("t1", "admin123"),
            ("c701", "club123"),
            ("c70", "class123"),
            ("teacher", "club123"),
            ("t", "club123"),
        ] {
            assert!(
                matches!(
                    authenticate(username, password, None),
                    Err(Error::InvalidCredentials)
                ),
                "{username} should be rejected"
            );
        }
    }
}
