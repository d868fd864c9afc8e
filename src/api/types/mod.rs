//! HTTP payload and error types

pub mod error;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
