//! Error types for the term-indexing core.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GeoTermError>;

/// Errors surfaced by tree construction, configuration and iteration.
///
/// Running out of precision during descent is not an error: descent past
/// `max_levels` is treated as a forced leaf. Iterator exhaustion is the
/// `None` of the iterator, not an error value.
#[derive(Debug, Error)]
pub enum GeoTermError {
    /// Unknown tree or strategy name, or a level/percentage out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The query geometry failed the relation oracle's validity rules.
    /// Iteration aborts; the enclosing query engine owns the user-visible
    /// rendering of this.
    #[error("invalid query shape: {0}")]
    InvalidShape(String),

    /// A cell term that no reachable navigation could have produced: the
    /// sentinel bit is missing, or the encoded level exceeds the tree.
    #[error("corrupted cell term {term:#018x}: {reason}")]
    InvariantViolation { term: u64, reason: String },
}

impl GeoTermError {
    pub(crate) fn corrupt_term(term: u64, reason: impl Into<String>) -> Self {
        GeoTermError::InvariantViolation {
            term,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoTermError::InvalidConfiguration("tree_levels 40 out of range".into());
        assert!(err.to_string().contains("invalid configuration"));

        let err = GeoTermError::corrupt_term(0x0, "no sentinel bit");
        assert!(err.to_string().contains("0x0000000000000000"));
        assert!(err.to_string().contains("no sentinel bit"));
    }
}
