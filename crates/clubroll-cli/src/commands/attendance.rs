use std::collections::BTreeMap;

use chrono::NaiveDate;
use clubroll_core::{AttendanceRecord, AttendanceStatus, ClubRoll};
use serde::Serialize;

use crate::commands::common::{parse_date, require_club_access, require_session};
use crate::error::CliError;

/// Status overrides given on the command line, applied over the draft.
#[derive(Debug, Default)]
pub struct RollCallMarks {
    pub absent: Vec<String>,
    pub late: Vec<String>,
    pub excused: Vec<String>,
}

impl RollCallMarks {
    fn entries(&self) -> impl Iterator<Item = (&str, AttendanceStatus)> {
        marked(&self.absent, AttendanceStatus::Absent)
            .chain(marked(&self.late, AttendanceStatus::Late))
            .chain(marked(&self.excused, AttendanceStatus::Excused))
    }
}

fn marked(
    ids: &[String],
    status: AttendanceStatus,
) -> impl Iterator<Item = (&str, AttendanceStatus)> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(move |id| (id, status))
}

/// Apply `marks` to a draft, rejecting ids that are not on the roster.
///
/// Members on leave end up EXCUSED when the record is saved, whatever they
/// were marked here.
pub fn apply_marks(
    mut draft: BTreeMap<String, AttendanceStatus>,
    marks: &RollCallMarks,
) -> Result<BTreeMap<String, AttendanceStatus>, CliError> {
    for (member_id, status) in marks.entries() {
        let slot = draft
            .get_mut(member_id)
            .ok_or_else(|| clubroll_core::Error::MemberNotFound(member_id.to_string()))?;
        *slot = status;
    }
    Ok(draft)
}

pub fn run_attendance_take(
    roll: &ClubRoll,
    club_id: &str,
    date: Option<&str>,
    marks: &RollCallMarks,
    notes: Option<String>,
) -> Result<(), CliError> {
    let user = require_session(roll)?;
    require_club_access(&user, club_id)?;
    let date = parse_date(date)?;

    let records = apply_marks(roll.roll_call_draft(club_id, date)?, marks)?;
    let mut record = AttendanceRecord::new(club_id, date, records);
    record.notes = notes;
    let saved = roll.save_attendance(record)?;

    println!(
        "Saved roll call for club {club_id} on {date}: {} present, {} absent, {} late, {} excused",
        saved.count(AttendanceStatus::Present),
        saved.count(AttendanceStatus::Absent),
        saved.count(AttendanceStatus::Late),
        saved.count(AttendanceStatus::Excused)
    );
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RollCallLine {
    pub member_id: String,
    pub name: String,
    pub status: Option<AttendanceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_reason: Option<String>,
}

pub fn roll_call_lines(
    roll: &ClubRoll,
    club_id: &str,
    date: NaiveDate,
) -> Result<Vec<RollCallLine>, CliError> {
    let members = roll
        .read(|state| state.club(club_id).map(|club| club.members.clone()))
        .ok_or_else(|| clubroll_core::Error::ClubNotFound(club_id.to_string()))?;

    Ok(members
        .into_iter()
        .map(|member| RollCallLine {
            status: roll.effective_status(club_id, &member.id, date),
            leave_reason: roll
                .leave_for(&member.id, date)
                .map(|leave| leave.reason),
            member_id: member.id,
            name: member.name,
        })
        .collect())
}

pub fn run_attendance_show(
    roll: &ClubRoll,
    club_id: &str,
    date: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let user = require_session(roll)?;
    require_club_access(&user, club_id)?;
    let date = parse_date(date)?;
    let lines = roll_call_lines(roll, club_id, date)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    match roll.attendance_for(club_id, date) {
        Some(record) => {
            println!("Roll call for club {club_id} on {date}");
            if let Some(notes) = record.notes {
                println!("Notes: {notes}");
            }
        }
        None => println!("No roll call saved for club {club_id} on {date}"),
    }
    for line in lines {
        let status = line
            .status
            .map_or_else(|| "-".to_string(), |status| status.to_string());
        match line.leave_reason.filter(|reason| !reason.is_empty()) {
            Some(reason) => println!(
                "{}  {:<8}  {} (leave: {reason})",
                line.member_id, status, line.name
            ),
            None => println!("{}  {:<8}  {}", line.member_id, status, line.name),
        }
    }
    Ok(())
}
