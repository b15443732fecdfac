//! Result type alias for mirrorcp operations

use crate::Error;

/// Result type alias for mirrorcp operations
pub type Result<T> = std::result::Result<T, Error>;
