//! Discord gateway event handlers
//!
//! Reactions on posted questions and direct-message submissions arrive here
//! rather than as commands.

/// Reaction and direct message handling
pub mod events;

pub use events::event_handler;
