use clubroll_core::models::MemberUpdate;
use clubroll_core::{ClubRoll, Member};

use crate::commands::common::{require_admin, require_club_access, require_session};
use crate::error::CliError;

pub fn format_member_lines(members: &[Member]) -> Vec<String> {
    members
        .iter()
        .map(|member| {
            format!(
                "{}  {}  class={}  student_id={}",
                member.id,
                member.name,
                if member.class_name.is_empty() {
                    "-"
                } else {
                    &member.class_name
                },
                member.student_id.as_deref().unwrap_or("-")
            )
        })
        .collect()
}

pub fn run_member_list(
    roll: &ClubRoll,
    club_id: &str,
    query: Option<&str>,
    as_json: bool,
) -> Result<(), CliError> {
    let user = require_session(roll)?;
    require_club_access(&user, club_id)?;

    let members = roll
        .read(|state| {
            state.club(club_id).map(|club| {
                club.members
                    .iter()
                    .filter(|member| member.matches(query.unwrap_or_default()))
                    .cloned()
                    .collect::<Vec<_>>()
            })
        })
        .ok_or_else(|| clubroll_core::Error::ClubNotFound(club_id.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&members)?);
    } else if members.is_empty() {
        println!("No members.");
    } else {
        for line in format_member_lines(&members) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_member_add(
    roll: &ClubRoll,
    club_id: &str,
    name: &str,
    student_id: Option<String>,
    class_name: &str,
) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "add members")?;
    let member = roll.add_member(club_id, Member::new(name, student_id, class_name))?;
    println!("{}", member.id);
    Ok(())
}

pub fn run_member_update(
    roll: &ClubRoll,
    club_id: &str,
    member_id: &str,
    update: MemberUpdate,
) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "edit members")?;
    if update == MemberUpdate::default() {
        return Err(CliError::NothingToUpdate);
    }
    roll.update_member(club_id, member_id, &update)?;
    println!("Updated member {member_id}");
    Ok(())
}

pub fn run_member_delete(roll: &ClubRoll, club_id: &str, member_id: &str) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "remove members")?;
    let member = roll.delete_member(club_id, member_id)?;
    println!("Removed {} ({})", member.name, member.id);
    Ok(())
}
