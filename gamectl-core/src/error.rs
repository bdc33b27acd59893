//! Error types for gamectl-core.

use thiserror::Error;

/// A flag name that matches none of the accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown flag '{input}'; expected: started, checkpoint1|cp1, checkpoint2|cp2, checkpoint3|cp3")]
pub struct FlagParseError {
    pub input: String,
}
