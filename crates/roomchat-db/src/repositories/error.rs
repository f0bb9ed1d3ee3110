//! Error handling utilities for repositories

use roomchat_common::AppError;
use roomchat_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Code reported when a query expected a row and got none
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Convert SQLx error to DomainError, keeping the SQLSTATE when there is one
pub fn map_db_error(e: SqlxError) -> DomainError {
    match &e {
        SqlxError::RowNotFound => DomainError::backend(NO_ROWS_CODE, "no rows returned"),
        SqlxError::Database(db_err) => match db_err.code() {
            Some(code) => DomainError::backend(code.into_owned(), db_err.message().to_string()),
            None => DomainError::DatabaseError(e.to_string()),
        },
        _ => DomainError::DatabaseError(e.to_string()),
    }
}

/// Check for unique violation and return appropriate error or fallback
pub fn map_unique_violation<F>(e: SqlxError, on_unique: F) -> DomainError
where
    F: FnOnce(Option<&str>) -> DomainError,
{
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique(db_err.constraint());
        }
    }
    map_db_error(e)
}

/// Fold auth utility failures into the domain error space
pub fn map_app_error(e: AppError) -> DomainError {
    match e {
        AppError::InvalidCredentials => DomainError::InvalidCredentials,
        AppError::InvalidToken | AppError::TokenExpired | AppError::NotAuthenticated => {
            DomainError::InvalidSession
        }
        AppError::Domain(inner) => inner,
        other => DomainError::InternalError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_no_rows_code() {
        match map_db_error(SqlxError::RowNotFound) {
            DomainError::Backend { code, .. } => assert_eq!(code, NO_ROWS_CODE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        assert!(matches!(
            map_db_error(SqlxError::PoolTimedOut),
            DomainError::DatabaseError(_)
        ));
    }

    #[test]
    fn test_app_error_mapping() {
        assert!(matches!(map_app_error(AppError::TokenExpired), DomainError::InvalidSession));
        assert!(matches!(
            map_app_error(AppError::InvalidCredentials),
            DomainError::InvalidCredentials
        ));
        assert!(matches!(
            map_app_error(AppError::internal(io_error())),
            DomainError::InternalError(_)
        ));
    }

    fn io_error() -> std::io::Error {
        std::io::Error::other("boom")
    }
}
