pub mod attendance;
pub mod club;
pub mod common;
pub mod leave;
pub mod member;
pub mod roster;
pub mod session;
pub mod summary;
pub mod sync;
