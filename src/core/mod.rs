//! Framework-agnostic question bot logic: rotation, vote decisions,
//! DM submission parsing and release notes.

pub mod release_notes;
pub mod rotation;
pub mod submission;
pub mod votes;
