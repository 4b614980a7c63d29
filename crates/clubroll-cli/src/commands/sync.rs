use clubroll_core::{ClubRoll, SyncOutcome, User};

use crate::commands::common::{
    explicit_sync_result, format_sync_conflict_lines, require_admin, require_session,
    sync_conflict_to_item, SyncConflictItem,
};
use crate::error::CliError;

pub async fn run_sync_pull(roll: &ClubRoll) -> Result<(), CliError> {
    require_session(roll)?;
    let outcome = explicit_sync_result(roll.sync_now().await)?;
    println!("Sync {outcome}");
    if let SyncOutcome::Merged(report) = outcome {
        for line in format_sync_conflict_lines(&report.conflicts) {
            println!("  {line}");
        }
    }
    Ok(())
}

pub async fn run_sync_push(roll: &ClubRoll) -> Result<(), CliError> {
    require_session(roll)?;
    let outcome = explicit_sync_result(roll.push_now().await)?;
    println!("Sync {outcome}");
    Ok(())
}

pub fn run_sync_conflicts(roll: &ClubRoll, limit: usize, as_json: bool) -> Result<(), CliError> {
    require_session(roll)?;
    let mut conflicts = roll.recent_conflicts();
    conflicts.reverse();
    conflicts.truncate(limit);

    if as_json {
        let json_items = conflicts
            .iter()
            .map(sync_conflict_to_item)
            .collect::<Vec<SyncConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_sync_conflict_lines(&conflicts) {
        println!("{line}");
    }
    Ok(())
}

/// Pull once, then keep polling until Ctrl-C.
pub async fn run_watch(roll: &ClubRoll) -> Result<(), CliError> {
    let user = require_session(roll)?;
    require_admin_sync(&user)?;

    let outcome = roll.sync_now().await;
    println!("Sync {outcome}");
    if !roll.resume_polling() {
        return Err(CliError::SyncNotConfigured);
    }

    let interval = roll.poll_interval();
    println!(
        "Watching for remote changes every {}s; press Ctrl-C to stop",
        interval.as_secs()
    );
    tokio::signal::ctrl_c().await?;
    println!("Stopping");
    Ok(())
}

fn require_admin_sync(user: &User) -> Result<(), CliError> {
    require_admin(user, "watch the shared dataset")?;
    if user.sync_code().is_none() {
        return Err(CliError::SyncNotConfigured);
    }
    Ok(())
}
