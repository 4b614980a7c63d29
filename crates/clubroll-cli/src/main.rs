//! ClubRoll CLI - club attendance from the command line
//!
//! Works offline against a local data directory and syncs through a shared
//! sync code when the session has one.

mod cli;
mod commands;
mod config;
mod error;

use clap::Parser;
use clubroll_core::models::MemberUpdate;
use clubroll_core::ClubRoll;

use crate::cli::{
    AttendanceCommands, Cli, ClubCommands, Commands, LeaveCommands, MemberCommands,
    RosterCommands, SyncCommands,
};
use crate::commands::attendance::{run_attendance_show, run_attendance_take, RollCallMarks};
use crate::commands::club::{run_club_add, run_club_delete, run_club_list, run_club_update};
use crate::commands::leave::{run_leave_cancel, run_leave_list, run_leave_set};
use crate::commands::member::{
    run_member_add, run_member_delete, run_member_list, run_member_update,
};
use crate::commands::roster::{run_roster_export, run_roster_import};
use crate::commands::session::{run_login, run_logout, run_whoami};
use crate::commands::summary::run_summary;
use crate::commands::sync::{run_sync_conflicts, run_sync_pull, run_sync_push, run_watch};
use crate::config::{load_config, open_service, resolve_data_dir};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clubroll=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let data_dir = resolve_data_dir(cli.data_dir, &config)?;
    let roll = open_service(&data_dir, &config)?;

    let result = dispatch(&roll, cli.command).await;
    // Mutations push in the background; let them land before exiting.
    roll.shutdown().await;
    result
}

async fn dispatch(roll: &ClubRoll, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Login {
            username,
            password,
            sync_code,
        } => run_login(roll, &username, &password, sync_code.as_deref()).await?,
        Commands::Logout => run_logout(roll),
        Commands::Whoami => run_whoami(roll),
        Commands::Club { command } => match command {
            ClubCommands::List { json } => run_club_list(roll, json)?,
            ClubCommands::Add { name, description } => run_club_add(roll, &name, &description)?,
            ClubCommands::Update {
                id,
                name,
                description,
            } => run_club_update(roll, &id, name.as_deref(), description.as_deref())?,
            ClubCommands::Delete { id } => run_club_delete(roll, &id)?,
        },
        Commands::Member { command } => match command {
            MemberCommands::List {
                club_id,
                query,
                json,
            } => run_member_list(roll, &club_id, query.as_deref(), json)?,
            MemberCommands::Add {
                club_id,
                name,
                student_id,
                class_name,
            } => run_member_add(roll, &club_id, &name, student_id, &class_name)?,
            MemberCommands::Update {
                club_id,
                member_id,
                name,
                student_id,
                class_name,
            } => run_member_update(
                roll,
                &club_id,
                &member_id,
                MemberUpdate {
                    name,
                    student_id,
                    class_name,
                },
            )?,
            MemberCommands::Delete { club_id, member_id } => {
                run_member_delete(roll, &club_id, &member_id)?;
            }
        },
        Commands::Roster { command } => match command {
            RosterCommands::Export { output } => run_roster_export(roll, output.as_deref())?,
            RosterCommands::Import { input } => run_roster_import(roll, &input)?,
        },
        Commands::Attendance { command } => match command {
            AttendanceCommands::Take {
                club_id,
                date,
                absent,
                late,
                excused,
                notes,
            } => run_attendance_take(
                roll,
                &club_id,
                date.as_deref(),
                &RollCallMarks {
                    absent,
                    late,
                    excused,
                },
                notes,
            )?,
            AttendanceCommands::Show {
                club_id,
                date,
                json,
            } => run_attendance_show(roll, &club_id, date.as_deref(), json)?,
        },
        Commands::Leave { command } => match command {
            LeaveCommands::Set {
                member_id,
                date,
                reason,
            } => run_leave_set(roll, &member_id, date.as_deref(), &reason)?,
            LeaveCommands::Cancel { leave_id } => run_leave_cancel(roll, &leave_id)?,
            LeaveCommands::List { date, json } => run_leave_list(roll, date.as_deref(), json)?,
        },
        Commands::Summary { date, json } => run_summary(roll, date.as_deref(), json)?,
        Commands::Sync { command } => match command {
            SyncCommands::Pull => run_sync_pull(roll).await?,
            SyncCommands::Push => run_sync_push(roll).await?,
            SyncCommands::Conflicts { limit, json } => run_sync_conflicts(roll, limit, json)?,
        },
        Commands::Watch => run_watch(roll).await?,
    }

    Ok(())
}
