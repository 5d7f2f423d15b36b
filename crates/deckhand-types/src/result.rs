//! Result type alias for deckhand operations

use crate::Error;

/// Result type alias for deckhand operations
pub type Result<T> = std::result::Result<T, Error>;
