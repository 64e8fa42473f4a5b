//! Conversions from external infrastructure errors into domain errors.

use rusqlite::Error as SqlError;
use slotline_domain::SlotlineError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SlotlineError);

impl From<InfraError> for SlotlineError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SlotlineError> for InfraError {
    fn from(value: SlotlineError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match err {
            RE::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (code.code, code.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SlotlineError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SlotlineError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        // UNIQUE violation; for bookings this means the start
                        // instant was taken by a racing write.
                        SlotlineError::InvalidInput("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SlotlineError::Database("foreign key constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, _) => {
                        SlotlineError::InvalidInput(format!("constraint violation: {message}"))
                    }
                    _ => SlotlineError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        code.code, code.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SlotlineError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SlotlineError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SlotlineError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => SlotlineError::Database("invalid UTF-8 returned from sqlite".into()),
            other => SlotlineError::Database(other.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(SlotlineError::Database(format!("connection pool error: {err}")))
    }
}

/// Convert a background-task join failure into a domain error.
pub(crate) fn map_join_error(err: tokio::task::JoinError) -> SlotlineError {
    SlotlineError::Internal(format!("database task join failed: {err}"))
}
