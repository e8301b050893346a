//! Errors produced by grids and particle mappers.

use thiserror::Error;

/// Failure of a grid or mapper operation.
///
/// All variants are fatal to the call that produced them. Operations
/// that fail leave grid and mapper state untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MapperError {
    /// An index or coordinate lies outside the valid bounds.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// The operation is not implemented for this kind of mapper.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// A constraining particle lies in the unrefined part of a zoom hierarchy.
    #[error(
        "Constraining particle {id} is in the low-resolution region (first high-resolution particle is {first_fine})"
    )]
    ConstraintInLowRes { id: usize, first_fine: usize },

    /// A requested region does not map onto the available grids.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// An invariant required at construction time does not hold.
    #[error("Inconsistent mapper setup: {0}")]
    Consistency(String),

    /// A configuration value is not acceptable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, MapperError>;
