//! Error types for clubroll-core

use thiserror::Error;

/// Result type alias using clubroll-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can reach a caller of clubroll-core operations.
///
/// Sync and persistence trouble is recovered inside the core and never shows
/// up here; these are rejections of a requested change or a login attempt.
#[derive(Error, Debug)]
pub enum Error {
    /// Club not found
    #[error("Club not found: {0}")]
    ClubNotFound(String),

    /// Member not found
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Leave record not found
    #[error("Leave record not found: {0}")]
    LeaveNotFound(String),

    /// A club with this id already exists
    #[error("Club already exists: {0}")]
    DuplicateClub(String),

    /// A member with this id already exists somewhere in the dataset
    #[error("Member already exists: {0}")]
    DuplicateMember(String),

    /// Clubs can only be deleted once their roster is empty
    #[error("Club \"{name}\" still has {count} member(s); remove them before deleting the club")]
    ClubHasMembers { name: String, count: usize },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Operation needs an active session
    #[error("Not logged in")]
    NotLoggedIn,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
