// API error responses

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::Responder;
use rocket::serde::json::Json;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON error responder used by every route handler
#[derive(Responder)]
pub enum ApiError {
    #[response(status = 400, content_type = "json")]
    BadRequest(Json<ErrorBody>),
    #[response(status = 401, content_type = "json")]
    Unauthorized(Json<ErrorBody>),
    #[response(status = 403, content_type = "json")]
    Forbidden(Json<ErrorBody>),
    #[response(status = 404, content_type = "json")]
    NotFound(Json<ErrorBody>),
    #[response(status = 412, content_type = "json")]
    PreconditionFailed(Json<ErrorBody>),
    #[response(status = 500, content_type = "json")]
    Internal(Json<ErrorBody>),
}

fn body(msg: impl Into<String>) -> Json<ErrorBody> {
    Json(ErrorBody { error: msg.into() })
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(body(msg))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(body(msg))
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(body(msg))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(body(msg))
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        ApiError::PreconditionFailed(body(msg))
    }

    /// Log the underlying error server-side and hand the client a generic 500
    pub fn internal(context: &str, err: impl Display) -> Self {
        eprintln!("Error {}: {}", context, err);
        ApiError::Internal(body("Internal server error"))
    }
}

/// True when the database rejected a write because of a unique constraint.
/// Duplicate votes and duplicate email registrations are detected this way
/// rather than with a check-then-insert that would race.
pub fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_is_classified() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("Duplicate entry".to_string()),
        );
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn other_database_errors_are_not_unique_violations() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("fk".to_string()),
        );
        assert!(!is_unique_violation(&err));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }

    #[test]
    fn error_body_shape() {
        let json = serde_json::to_value(ErrorBody {
            error: "You have already voted in this election".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error": "You have already voted in this election"})
        );
    }
}
