use chrono::NaiveDate;
use clubroll_core::models::{ConflictResolution, MergeConflict};
use clubroll_core::util::local_today;
use clubroll_core::{ClubRoll, SyncOutcome, User};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct SyncConflictItem {
    pub club_id: String,
    pub date: NaiveDate,
    pub local_updated_at: i64,
    pub incoming_updated_at: i64,
    pub resolved_at: i64,
    pub resolved_at_iso: String,
    pub resolution: ConflictResolution,
}

pub fn sync_conflict_to_item(conflict: &MergeConflict) -> SyncConflictItem {
    SyncConflictItem {
        club_id: conflict.club_id.clone(),
        date: conflict.date,
        local_updated_at: conflict.local_updated_at,
        incoming_updated_at: conflict.incoming_updated_at,
        resolved_at: conflict.resolved_at,
        resolved_at_iso: format_sync_timestamp(conflict.resolved_at),
        resolution: conflict.resolution,
    }
}

pub fn format_sync_conflict_lines(conflicts: &[MergeConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            format!(
                "{}  {:<11}  club={} date={}  local={} incoming={}",
                format_sync_timestamp(conflict.resolved_at),
                resolution_label(conflict.resolution),
                conflict.club_id,
                conflict.date,
                conflict.local_updated_at,
                conflict.incoming_updated_at
            )
        })
        .collect()
}

const fn resolution_label(resolution: ConflictResolution) -> &'static str {
    match resolution {
        ConflictResolution::KeptLocal => "kept_local",
        ConflictResolution::TookRemote => "took_remote",
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else {
        format!("{}d ago", diff / day)
    }
}

/// Parse `YYYY-MM-DD`, defaulting to today's local date.
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, CliError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| CliError::InvalidDate(value.to_string())),
        None => Ok(local_today()),
    }
}

pub fn require_session(roll: &ClubRoll) -> Result<User, CliError> {
    roll.session()
        .ok_or(CliError::Core(clubroll_core::Error::NotLoggedIn))
}

pub fn require_admin(user: &User, action: &str) -> Result<(), CliError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(CliError::Forbidden(format!(
            "only administrators can {action}"
        )))
    }
}

/// Admins may take any roll call; club teachers only their own club's.
pub fn require_club_access(user: &User, club_id: &str) -> Result<(), CliError> {
    if user.is_admin() || user.assigned_club_id.as_deref() == Some(club_id) {
        Ok(())
    } else {
        Err(CliError::Forbidden(format!(
            "{} is not assigned to club {club_id}",
            user.username
        )))
    }
}

/// Turn an explicit sync request's outcome into a command result.
pub fn explicit_sync_result(outcome: SyncOutcome) -> Result<SyncOutcome, CliError> {
    match outcome {
        SyncOutcome::Disabled => Err(CliError::SyncNotConfigured),
        SyncOutcome::Failed(reason) => Err(CliError::SyncFailed(reason)),
        other => Ok(other),
    }
}
