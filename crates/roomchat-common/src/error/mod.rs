//! Application error types

mod app_error;

pub use app_error::{describe_backend_code, AppError, AppResult, ErrorReport, GENERIC_ERROR_MESSAGE};
