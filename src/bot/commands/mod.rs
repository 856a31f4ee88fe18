//! Discord command implementations organized by category.

/// Channel subscription and rotation commands
pub mod channel;

/// General utility commands
pub mod general;

// Export commands
pub use channel::*;
pub use general::*;
