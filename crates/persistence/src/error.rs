//! Conversion of database failures into backend errors.

use domain::BackendError;

/// Maps a sqlx error onto the domain's backend error kinds.
pub fn backend_error(err: sqlx::Error) -> BackendError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => BackendError::Unavailable(err.to_string()),
        sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => BackendError::Decode(err.to_string()),
        other => BackendError::Request(other.to_string()),
    }
}
