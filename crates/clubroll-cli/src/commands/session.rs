use clubroll_core::util::unix_millis_now;
use clubroll_core::{ClubRoll, SyncOutcome};

use crate::commands::common::{format_relative_time, format_sync_timestamp};
use crate::error::CliError;

pub async fn run_login(
    roll: &ClubRoll,
    username: &str,
    password: &str,
    sync_code: Option<&str>,
) -> Result<(), CliError> {
    let login = roll.login(username, password, sync_code).await?;
    println!("Logged in as {} ({})", login.user.name, login.user.role);

    match login.sync {
        SyncOutcome::Disabled => println!("Local-only mode: no sync code"),
        SyncOutcome::Failed(reason) => {
            println!("Initial sync failed ({reason}); working from local data");
        }
        outcome => println!("Initial sync {outcome}"),
    }
    Ok(())
}

pub fn run_logout(roll: &ClubRoll) {
    if roll.session().is_some() {
        roll.logout();
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
}

pub fn run_whoami(roll: &ClubRoll) {
    for line in whoami_lines(roll, unix_millis_now()) {
        println!("{line}");
    }
}

pub fn whoami_lines(roll: &ClubRoll, now_ms: i64) -> Vec<String> {
    let Some(user) = roll.session() else {
        return vec!["Not logged in".to_string()];
    };

    let mut lines = vec![format!("{} ({}, {})", user.name, user.username, user.role)];
    if let Some(club_id) = &user.assigned_club_id {
        lines.push(format!("Assigned club: {club_id}"));
    }
    if let Some(class_name) = &user.assigned_class_name {
        lines.push(format!("Assigned class: {class_name}"));
    }
    lines.push(if user.sync_code().is_some() {
        format!("Sync: enabled ({})", roll.sync_state())
    } else {
        "Sync: local only".to_string()
    });
    if let Some(synced_at) = roll.read(|state| state.last_synced_at) {
        lines.push(format!(
            "Last synced: {} ({})",
            format_sync_timestamp(synced_at),
            format_relative_time(synced_at, now_ms)
        ));
    }
    lines
}
