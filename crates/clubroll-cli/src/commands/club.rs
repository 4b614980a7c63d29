use clubroll_core::{Club, ClubRoll};
use serde::Serialize;

use crate::commands::common::{require_admin, require_session};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ClubListItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub members: usize,
}

pub fn club_to_list_item(club: &Club) -> ClubListItem {
    ClubListItem {
        id: club.id.clone(),
        name: club.name.clone(),
        description: club.description.clone(),
        members: club.members.len(),
    }
}

pub fn format_club_lines(clubs: &[Club]) -> Vec<String> {
    clubs
        .iter()
        .map(|club| {
            let mut line = format!("{}  {} ({} members)", club.id, club.name, club.members.len());
            if !club.description.is_empty() {
                line.push_str("  ");
                line.push_str(&club.description);
            }
            line
        })
        .collect()
}

pub fn run_club_list(roll: &ClubRoll, as_json: bool) -> Result<(), CliError> {
    require_session(roll)?;
    let clubs = roll.read(|state| state.clubs.clone());

    if as_json {
        let items = clubs.iter().map(club_to_list_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if clubs.is_empty() {
        println!("No clubs.");
    } else {
        for line in format_club_lines(&clubs) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn run_club_add(roll: &ClubRoll, name: &str, description: &str) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "create clubs")?;
    let club = roll.create_club(name, description)?;
    println!("{}", club.id);
    Ok(())
}

pub fn run_club_update(
    roll: &ClubRoll,
    club_id: &str,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "edit clubs")?;
    if name.is_none() && description.is_none() {
        return Err(CliError::NothingToUpdate);
    }

    let (current_name, current_description) = roll
        .read(|state| {
            state
                .club(club_id)
                .map(|club| (club.name.clone(), club.description.clone()))
        })
        .ok_or_else(|| clubroll_core::Error::ClubNotFound(club_id.to_string()))?;

    roll.update_club(
        club_id,
        name.unwrap_or(&current_name),
        description.unwrap_or(&current_description),
    )?;
    println!("Updated club {club_id}");
    Ok(())
}

pub fn run_club_delete(roll: &ClubRoll, club_id: &str) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "delete clubs")?;
    let club = roll.delete_club(club_id)?;
    println!("Deleted club {} ({})", club.id, club.name);
    Ok(())
}
