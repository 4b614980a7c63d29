//! Shared services used across clients.

mod clubroll;
mod state_cell;

pub use clubroll::{ClubRoll, Login};
pub use state_cell::StateCell;
