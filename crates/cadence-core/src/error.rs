//! Error Types
//!
//! One error enum for the scheduling core. Storage has its own error type
//! (see [`crate::storage::StorageError`]) that wraps this one.

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Core error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CadenceError {
    /// Input rejected at the boundary, before any state was touched
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Item has no scheduling state (strict mode only)
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    /// Learner has no state
    #[error("Unknown learner: {0}")]
    UnknownLearner(String),
    /// Component refused to build from the given configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Snapshot was produced by an incompatible version
    #[error("Unsupported snapshot version {found} (supported: {supported})")]
    UnsupportedSnapshot {
        /// Version found in the snapshot
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },
    /// JSON (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Core result type
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Reject a value outside `[min, max]` (also rejects NaN).
pub(crate) fn ensure_range(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(CadenceError::InvalidInput(format!(
            "{} must be within [{}, {}], got {}",
            name, min, max, value
        )))
    }
}

/// Reject negative or non-finite durations.
pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CadenceError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}
