//! clubroll-core - Core library for ClubRoll
//!
//! This crate contains the shared models, merge engine, local store and
//! snapshot sync used by every ClubRoll interface.

pub mod auth;
pub mod config;
pub mod error;
pub mod merge;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use merge::{merge, MergeOutcome, MergeReport};
pub use models::{
    AppState, AttendanceRecord, AttendanceStatus, Club, LeaveRecord, Member, Snapshot, User,
    UserRole,
};
pub use services::{ClubRoll, Login};
pub use state::{DailySummary, RosterRow};
pub use sync::{SyncOutcome, SyncState};
