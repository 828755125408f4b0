//! Translation of driver errors into [`CoreError`] kinds.
//!
//! Nothing raw from sqlx leaves this crate: every store failure passes
//! through [`classify_sqlx_error`] first.

use marquee_core::error::CoreError;

use crate::retry::is_transient;

/// Partial unique index on `lower(title)` over Active rows.
pub const UQ_ACTIVE_TITLE: &str = "uq_movies_active_title";

/// Unique constraint on the public SID.
pub const UQ_SID: &str = "uq_movies_sid";

const UNIQUE_VIOLATION: &str = "23505";

/// Map a sqlx error raised while performing `context` onto a domain error.
///
/// - Unique violations (23505) become `Conflict`.
/// - Connectivity faults become `TransientStore`.
/// - Everything else, row decode failures included, is logged and reported
///   as a sanitized `Internal`. Malformed search payloads are caught by the
///   executor's own decoding and reported as `Serialization` there.
pub fn classify_sqlx_error(err: &sqlx::Error, context: &str) -> CoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            tracing::debug!(constraint, context, "Unique constraint violated");
            let message = match constraint {
                UQ_ACTIVE_TITLE => "A movie with the same title already exists".to_string(),
                UQ_SID => "Generated SID collided with an existing movie; retry the request"
                    .to_string(),
                other => format!("Duplicate value violates unique constraint: {other}"),
            };
            CoreError::Conflict(message)
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            tracing::error!(error = %err, context, "Failed to decode store row");
            CoreError::Internal(format!("Failed to {context}"))
        }
        err if is_transient(err) => {
            tracing::warn!(error = %err, context, "Store unavailable");
            CoreError::TransientStore(format!(
                "The data store is temporarily unavailable while trying to {context}"
            ))
        }
        other => {
            tracing::error!(error = %other, context, "Database error");
            CoreError::Internal(format!("Failed to {context}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pool_timeout_is_transient_store() {
        let err = classify_sqlx_error(&sqlx::Error::PoolTimedOut, "load movies");
        assert_matches!(err, CoreError::TransientStore(msg) if msg.contains("load movies"));
    }

    #[test]
    fn unexpected_errors_are_sanitized() {
        let err = classify_sqlx_error(&sqlx::Error::RowNotFound, "update movie");
        assert_matches!(err, CoreError::Internal(msg) if msg == "Failed to update movie");
    }

    #[test]
    fn row_decode_failures_are_internal() {
        let err = sqlx::Error::Decode("bad status id".into());
        assert_matches!(
            classify_sqlx_error(&err, "load movies"),
            CoreError::Internal(msg) if msg == "Failed to load movies"
        );

        let err = sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: "unexpected value 7".into(),
        };
        assert_matches!(classify_sqlx_error(&err, "load movies"), CoreError::Internal(_));
    }
}
