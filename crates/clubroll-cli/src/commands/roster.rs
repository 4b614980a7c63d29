use std::path::Path;

use clubroll_core::{AppState, ClubRoll, Member, RosterRow};
use serde::{Deserialize, Serialize};

use crate::commands::common::{require_admin, require_session};
use crate::error::CliError;

/// One roster row as exchanged with spreadsheets. A missing `id` means a new
/// member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterItem {
    pub club_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default)]
    pub class_name: String,
}

pub fn roster_items(state: &AppState) -> Vec<RosterItem> {
    state
        .clubs
        .iter()
        .flat_map(|club| {
            club.members.iter().map(|member| RosterItem {
                club_id: club.id.clone(),
                id: Some(member.id.clone()),
                name: member.name.clone(),
                student_id: member.student_id.clone(),
                class_name: member.class_name.clone(),
            })
        })
        .collect()
}

pub fn items_to_rows(items: Vec<RosterItem>) -> Vec<RosterRow> {
    items
        .into_iter()
        .map(|item| {
            let mut member = Member::new(item.name, item.student_id, item.class_name);
            if let Some(id) = item.id.filter(|id| !id.trim().is_empty()) {
                member.id = id.trim().to_string();
            }
            RosterRow {
                club_id: item.club_id,
                member,
            }
        })
        .collect()
}

pub fn run_roster_export(roll: &ClubRoll, output: Option<&Path>) -> Result<(), CliError> {
    require_session(roll)?;
    let items = roll.read(roster_items);
    let rendered = serde_json::to_string_pretty(&items)?;

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        println!("Exported {} rows to {}", items.len(), path.display());
    } else {
        println!("{rendered}");
    }
    Ok(())
}

pub fn run_roster_import(roll: &ClubRoll, input: &Path) -> Result<(), CliError> {
    require_admin(&require_session(roll)?, "replace rosters")?;
    let raw = std::fs::read_to_string(input)?;
    let items = serde_json::from_str::<Vec<RosterItem>>(&raw)?;
    let count = items.len();

    roll.replace_roster(items_to_rows(items))?;
    println!("Imported {count} roster rows");
    Ok(())
}
