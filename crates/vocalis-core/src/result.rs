//! Convenience result type alias for Vocalis.

use crate::error::AppError;

/// A specialized `Result` type for Vocalis operations.
pub type AppResult<T> = Result<T, AppError>;
