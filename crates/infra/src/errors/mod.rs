//! Conversions from external infrastructure errors into domain errors.

use chronoboard_domain::ChronoBoardError;
use r2d2::Error as PoolError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ChronoBoardError);

impl From<InfraError> for ChronoBoardError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ChronoBoardError> for InfraError {
    fn from(value: ChronoBoardError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;

        let domain_err = match &err {
            SqlError::SqliteFailure(failure, _) => match (failure.code, failure.extended_code) {
                (ErrorCode::DatabaseBusy, _) => {
                    ChronoBoardError::Storage("database is busy".into())
                }
                (ErrorCode::DatabaseLocked, _) => {
                    ChronoBoardError::Storage("database is locked".into())
                }
                (ErrorCode::ConstraintViolation, 1555 | 2067) => {
                    ChronoBoardError::Storage("unique constraint violation".into())
                }
                _ => ChronoBoardError::Storage(err.to_string()),
            },
            SqlError::QueryReturnedNoRows => {
                ChronoBoardError::NotFound("query returned no rows".into())
            }
            _ => ChronoBoardError::Storage(err.to_string()),
        };

        InfraError(domain_err)
    }
}

impl From<PoolError> for InfraError {
    fn from(err: PoolError) -> Self {
        InfraError(ChronoBoardError::Storage(format!("connection pool: {err}")))
    }
}
