use clubroll_core::{ClubRoll, LeaveRecord, User};

use crate::commands::common::{parse_date, require_session};
use crate::error::CliError;

/// Admins handle every leave; class teachers only their own class's.
pub fn require_leave_access(user: &User, member_class: &str) -> Result<(), CliError> {
    if user.is_admin() || user.assigned_class_name.as_deref() == Some(member_class) {
        Ok(())
    } else {
        Err(CliError::Forbidden(format!(
            "{} cannot manage leaves for class {member_class}",
            user.username
        )))
    }
}

pub fn format_leave_lines(leaves: &[LeaveRecord]) -> Vec<String> {
    leaves
        .iter()
        .map(|leave| {
            let mut line = format!(
                "{}  {}  {} ({})",
                leave.id, leave.date, leave.student_name, leave.member_id
            );
            if !leave.reason.is_empty() {
                line.push_str("  ");
                line.push_str(&leave.reason);
            }
            line
        })
        .collect()
}

pub fn run_leave_set(
    roll: &ClubRoll,
    member_id: &str,
    date: Option<&str>,
    reason: &str,
) -> Result<(), CliError> {
    let user = require_session(roll)?;
    let date = parse_date(date)?;
    let member = roll
        .read(|state| state.find_member(member_id).map(|(_, member)| member.clone()))
        .ok_or_else(|| clubroll_core::Error::MemberNotFound(member_id.to_string()))?;
    require_leave_access(&user, &member.class_name)?;

    let leave = roll.set_leave(LeaveRecord::new(&member.id, &member.name, date, reason))?;
    println!("{}", leave.id);
    Ok(())
}

pub fn run_leave_cancel(roll: &ClubRoll, leave_id: &str) -> Result<(), CliError> {
    let user = require_session(roll)?;
    let member_class = roll
        .read(|state| {
            let leave = state.leave_records.iter().find(|leave| leave.id == leave_id)?;
            Some(
                state
                    .find_member(&leave.member_id)
                    .map(|(_, member)| member.class_name.clone())
                    .unwrap_or_default(),
            )
        })
        .ok_or_else(|| clubroll_core::Error::LeaveNotFound(leave_id.to_string()))?;
    require_leave_access(&user, &member_class)?;

    let leave = roll.cancel_leave(leave_id)?;
    println!("Cancelled leave for {} on {}", leave.student_name, leave.date);
    Ok(())
}

pub fn run_leave_list(roll: &ClubRoll, date: Option<&str>, as_json: bool) -> Result<(), CliError> {
    require_session(roll)?;
    let date = date.map(|value| parse_date(Some(value))).transpose()?;
    let mut leaves = roll.read(|state| {
        state
            .leave_records
            .iter()
            .filter(|leave| date.map_or(true, |date| leave.date == date))
            .cloned()
            .collect::<Vec<_>>()
    });
    leaves.sort_by(|left, right| {
        left.date
            .cmp(&right.date)
            .then_with(|| left.student_name.cmp(&right.student_name))
    });

    if as_json {
        println!("{}", serde_json::to_string_pretty(&leaves)?);
    } else if leaves.is_empty() {
        println!("No leaves.");
    } else {
        for line in format_leave_lines(&leaves) {
            println!("{line}");
        }
    }
    Ok(())
}
