//! Sort error codes.

use accel_runtime::RuntimeError;
use thiserror::Error;

/// Errors reported by the sort entry points.
///
/// Everything except [`SortError::Runtime`] is detected before the first
/// launch is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("scratch buffer too small: need {required} slots, got {provided}")]
    UndersizedScratch { required: usize, provided: usize },
    #[error("provider scratch is already borrowed by another sort")]
    ScratchBusy,
    #[error("key type with size {size} and alignment {align} cannot be placed in scratch")]
    UnsupportedKeyLayout { size: usize, align: usize },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, SortError>;
