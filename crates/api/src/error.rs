use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use history_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `history_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A malformed request (body, path or query).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<history_restore::RestoreError> for AppError {
    fn from(err: history_restore::RestoreError) -> Self {
        AppError::Core(err.into())
    }
}

impl AppError {
    /// Status and machine-readable code, without side effects.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                CoreError::Expired(_) => (StatusCode::GONE, "EXPIRED"),
                CoreError::AlreadyProcessed(_) => (StatusCode::CONFLICT, "ALREADY_PROCESSED"),
                CoreError::NotUndoable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_UNDOABLE"),
                CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                CoreError::UnsupportedEntity(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNSUPPORTED_ENTITY")
                }
                CoreError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILURE"),
                CoreError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Core(CoreError::NotFound { entity, id }) => {
                format!("{entity} with id {id} not found")
            }
            AppError::Core(CoreError::Upstream {
                collaborator,
                status: upstream_status,
                message,
                ..
            }) => match upstream_status {
                Some(s) => format!("{collaborator} rejected the restoration ({s}): {message}"),
                None => format!("{collaborator} could not be reached: {message}"),
            },
            AppError::Core(CoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "Internal core error");
                "An internal error occurred".to_string()
            }
            AppError::Core(CoreError::UnsupportedEntity(entity_type)) => {
                format!("Entity type '{entity_type}' cannot be restored")
            }
            AppError::Core(
                CoreError::Validation(msg)
                | CoreError::Expired(msg)
                | CoreError::AlreadyProcessed(msg)
                | CoreError::NotUndoable(msg)
                | CoreError::Unauthorized(msg)
                | CoreError::Forbidden(msg),
            ) => msg.clone(),
            AppError::Database(err) => match code {
                "INTERNAL_ERROR" => {
                    tracing::error!(error = %err, "Database error");
                    "An internal error occurred".to_string()
                }
                "NOT_FOUND" => "Resource not found".to_string(),
                _ => "This action has already been processed".to_string(),
            },
            AppError::BadRequest(msg) => msg.clone(),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status and error code.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on `uq_undo_tokens_*` mean a concurrent undo already
///   issued the token, so they map to 409 `ALREADY_PROCESSED`.
/// - Everything else maps to 500.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        sqlx::Error::Database(db_err)
            if db_err.code().as_deref() == Some("23505")
                && db_err
                    .constraint()
                    .is_some_and(|c| c.starts_with("uq_undo_tokens")) =>
        {
            (StatusCode::CONFLICT, "ALREADY_PROCESSED")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn domain_errors_map_to_distinct_statuses() {
        let cases = [
            (CoreError::Expired("x".into()), StatusCode::GONE, "EXPIRED"),
            (
                CoreError::AlreadyProcessed("x".into()),
                StatusCode::CONFLICT,
                "ALREADY_PROCESSED",
            ),
            (
                CoreError::NotUndoable("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOT_UNDOABLE",
            ),
            (CoreError::Forbidden("x".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (
                CoreError::UnsupportedEntity("coupon".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNSUPPORTED_ENTITY",
            ),
            (
                CoreError::Validation("x".into()),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                CoreError::NotFound {
                    entity: "history_entry",
                    id: Uuid::nil(),
                },
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(AppError::Core(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn row_not_found_is_404() {
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
    }

    #[tokio::test]
    async fn upstream_failure_body_names_collaborator() {
        let err = AppError::Core(CoreError::Upstream {
            collaborator: "store-management".into(),
            entity_id: "M1".into(),
            status: Some(500),
            message: "database unavailable".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "UPSTREAM_FAILURE");
        assert_eq!(
            json["error"],
            "store-management rejected the restoration (500): database unavailable"
        );
    }
}
