use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clubroll")]
#[command(about = "Track club attendance offline and sync it through a shared code")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding local state (defaults to the platform data dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and pull the shared dataset
    Login {
        /// admin, t{club} or c{class}
        username: String,
        #[arg(short, long)]
        password: String,
        /// Shared sync code (omit for local-only mode)
        #[arg(long, value_name = "CODE")]
        sync_code: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show the current session and sync status
    Whoami,
    /// Manage clubs
    Club {
        #[command(subcommand)]
        command: ClubCommands,
    },
    /// Manage club members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Bulk roster export and import
    Roster {
        #[command(subcommand)]
        command: RosterCommands,
    },
    /// Take or show roll calls
    Attendance {
        #[command(subcommand)]
        command: AttendanceCommands,
    },
    /// File, cancel or list leaves
    Leave {
        #[command(subcommand)]
        command: LeaveCommands,
    },
    /// Daily dashboard counters
    Summary {
        /// Day to summarize (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pull, push or inspect sync conflicts
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Keep pulling the shared dataset until interrupted (admin only)
    Watch,
}

#[derive(Subcommand)]
pub enum ClubCommands {
    /// List clubs
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a club
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Rename or re-describe a club
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an empty club and its roll calls
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// List a club's members
    List {
        club_id: String,
        /// Filter by name, class or student id
        #[arg(short, long)]
        query: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a member to a club
    Add {
        club_id: String,
        name: String,
        #[arg(long, value_name = "ID")]
        student_id: Option<String>,
        #[arg(long = "class", value_name = "CLASS", default_value = "")]
        class_name: String,
    },
    /// Change a member's details
    Update {
        club_id: String,
        member_id: String,
        #[arg(long)]
        name: Option<String>,
        /// Empty string clears the student id
        #[arg(long, value_name = "ID")]
        student_id: Option<String>,
        #[arg(long = "class", value_name = "CLASS")]
        class_name: Option<String>,
    },
    /// Remove a member from a club
    Delete { club_id: String, member_id: String },
}

#[derive(Subcommand)]
pub enum RosterCommands {
    /// Write every club's roster as JSON
    Export {
        /// Output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Replace every roster with the rows of a JSON file
    Import {
        #[arg(value_name = "PATH")]
        input: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AttendanceCommands {
    /// Record a roll call; unlisted members are present (or excused on leave)
    Take {
        club_id: String,
        /// Day of the roll call (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Member ids marked absent
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        absent: Vec<String>,
        /// Member ids marked late
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        late: Vec<String>,
        /// Member ids marked excused
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        excused: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show a club's roll call for a day
    Show {
        club_id: String,
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum LeaveCommands {
    /// File a leave for a member
    Set {
        member_id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Cancel a leave by id
    Cancel { leave_id: String },
    /// List leaves
    List {
        /// Only this day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Pull and merge the shared dataset
    Pull,
    /// Push the local dataset
    Push,
    /// List recently resolved sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
