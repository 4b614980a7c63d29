//! Leave model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::new_record_id;

/// An approved absence for one member on one day.
///
/// While it exists the member's effective status for that day is EXCUSED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRecord {
    pub id: String,
    pub member_id: String,
    /// Display name captured when the leave was filed
    #[serde(default)]
    pub student_name: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: String,
}

impl LeaveRecord {
    #[must_use]
    pub fn new(
        member_id: impl Into<String>,
        student_name: impl Into<String>,
        date: NaiveDate,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: new_record_id("leave"),
            member_id: member_id.into(),
            student_name: student_name.into(),
            date,
            reason: reason.into().trim().to_string(),
        }
    }

    #[must_use]
    pub fn covers(&self, member_id: &str, date: NaiveDate) -> bool {
        self.member_id == member_id && self.date == date
    }
}
