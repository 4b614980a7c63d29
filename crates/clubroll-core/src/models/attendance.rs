//! Attendance model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::new_record_id;

/// Attendance status of one member on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    /// Derived from an active leave record
    Excused,
}

impl AttendanceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "PRESENT",
            Self::Absent => "ABSENT",
            Self::Late => "LATE",
            Self::Excused => "EXCUSED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRESENT" | "P" => Ok(Self::Present),
            "ABSENT" | "A" => Ok(Self::Absent),
            "LATE" | "L" => Ok(Self::Late),
            "EXCUSED" | "E" => Ok(Self::Excused),
            other => Err(format!("unknown attendance status '{other}'")),
        }
    }
}

/// Business key of an attendance record: one record per club per day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttendanceKey {
    pub club_id: String,
    pub date: NaiveDate,
}

/// One roll call: every member's status for a club on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Surrogate id; the business key is `(club_id, date)`
    pub id: String,
    pub club_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub records: BTreeMap<String, AttendanceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Last write timestamp (Unix ms); orders conflicting writes during merge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl AttendanceRecord {
    /// Create a record with a fresh id; `updated_at` is stamped on save.
    #[must_use]
    pub fn new(
        club_id: impl Into<String>,
        date: NaiveDate,
        records: BTreeMap<String, AttendanceStatus>,
    ) -> Self {
        Self {
            id: new_record_id("att"),
            club_id: club_id.into(),
            date,
            records,
            notes: None,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey {
            club_id: self.club_id.clone(),
            date: self.date,
        }
    }

    #[must_use]
    pub fn has_key(&self, club_id: &str, date: NaiveDate) -> bool {
        self.club_id == club_id && self.date == date
    }

    /// Write timestamp with absence treated as the oldest possible write.
    #[must_use]
    pub fn updated_at_or_zero(&self) -> i64 {
        self.updated_at.unwrap_or(0)
    }

    /// Number of entries with the given status
    #[must_use]
    pub fn count(&self, status: AttendanceStatus) -> usize {
        self.records.values().filter(|value| **value == status).count()
    }
}
