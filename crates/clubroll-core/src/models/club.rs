//! Club and member models

use serde::{Deserialize, Serialize};

use super::new_record_id;
use crate::util::normalize_text_option;

/// A student on a club roster.
///
/// Member ids are unique across the whole dataset, not only within a club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    /// School-issued student number, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// Homeroom class, e.g. "701"
    #[serde(default)]
    pub class_name: String,
}

impl Member {
    /// Create a member with a fresh id
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        student_id: Option<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id("m"),
            name: name.into().trim().to_string(),
            student_id: normalize_text_option(student_id),
            class_name: class_name.into().trim().to_string(),
        }
    }

    /// Case-insensitive match against name, class or student id.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.class_name.to_lowercase().contains(&query)
            || self
                .student_id
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(&query))
    }
}

/// Partial update of a member's mutable attributes.
///
/// `None` leaves a field untouched. An empty `student_id` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub class_name: Option<String>,
}

impl MemberUpdate {
    pub(crate) fn apply_to(&self, member: &mut Member) {
        if let Some(name) = normalize_text_option(self.name.clone()) {
            member.name = name;
        }
        if let Some(student_id) = &self.student_id {
            member.student_id = normalize_text_option(Some(student_id.clone()));
        }
        if let Some(class_name) = &self.class_name {
            member.class_name = class_name.trim().to_string();
        }
    }
}

/// A club and its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Creation timestamp (Unix ms)
    #[serde(default)]
    pub created_at: i64,
    /// Roster in insertion order
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Club {
    /// Create an empty club with a fresh id
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: new_record_id("club"),
            name: name.into().trim().to_string(),
            description: description.into().trim().to_string(),
            created_at: chrono::Utc::now().timestamp_millis(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.id == member_id)
    }

    #[must_use]
    pub fn has_member(&self, member_id: &str) -> bool {
        self.member(member_id).is_some()
    }
}
