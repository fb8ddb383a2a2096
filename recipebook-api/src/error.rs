/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `ApiResult<T>`; domain errors from the shared crate
/// convert with `?`.
///
/// # Example
///
/// ```no_run
/// use recipebook_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Recipe not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recipebook_shared::error::ServiceError;
use recipebook_shared::shopping_list::ShoppingListError;
use serde::{Deserialize, Serialize};
use sqlx::error::ErrorKind;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Relation already exists or is missing (400)
    Conflict(String),

    /// Field-keyed validation errors (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "validation_error", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.into(),
            message: message.into(),
        }])
    }

    /// Status code this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Conflict(_) | ApiError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (error_code, message, details) = match self {
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Unauthorized(msg) => ("unauthorized", msg, None),
            ApiError::Forbidden(msg) => ("forbidden", msg, None),
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::ValidationError(errors) => (
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                ("internal_error", "An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Foreign keys that point at the acting user
///
/// A violation means a valid token names an account that no longer exists.
const ACTING_USER_FOREIGN_KEYS: [&str; 4] = [
    "recipes_author_id_fkey",
    "favorites_user_id_fkey",
    "shopping_cart_user_id_fkey",
    "subscriptions_follower_id_fkey",
];

fn foreign_key_error(constraint: Option<&str>) -> ApiError {
    match constraint {
        Some(name) if ACTING_USER_FOREIGN_KEYS.contains(&name) => {
            ApiError::Unauthorized("User account no longer exists".to_string())
        }
        _ => ApiError::NotFound("Referenced resource not found".to_string()),
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if matches!(db_err.kind(), ErrorKind::ForeignKeyViolation) {
                    return foreign_key_error(db_err.constraint());
                }

                if let Some(constraint) = db_err.constraint() {
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert domain errors to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { field, message } => ApiError::validation(field, message),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::Database(e) => e.into(),
            ServiceError::Media(e) => ApiError::InternalError(format!("Media storage error: {}", e)),
        }
    }
}

/// Convert shopping list errors to API errors
impl From<ShoppingListError> for ApiError {
    fn from(err: ShoppingListError) -> Self {
        match err {
            ShoppingListError::Database(e) => e.into(),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

/// Convert malformed JSON bodies to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert request-body validation errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| ValidationErrorDetail {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_conflict_and_validation_are_bad_requests() {
        assert_eq!(ApiError::Conflict("dup".to_string()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::validation("tags", "required").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Forbidden("no".to_string()).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = ServiceError::validation("ingredients", "Ingredients must be unique").into();
        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "ingredients");
            }
            other => panic!("unexpected {:?}", other),
        }

        let err: ApiError = ServiceError::NotFound("Recipe not found".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = ServiceError::Conflict("Recipe is already in favorites".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validator_errors_are_field_keyed() {
        #[derive(Validate)]
        struct Input {
            #[validate(length(min = 1, max = 4, message = "too long"))]
            name: String,
        }

        let errors = Input { name: "abcdef".to_string() }.validate().unwrap_err();
        match ApiError::from(errors) {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "name");
                assert_eq!(details[0].message, "too long");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_foreign_key_violations() {
        for constraint in ACTING_USER_FOREIGN_KEYS {
            assert_eq!(foreign_key_error(Some(constraint)).status(), StatusCode::UNAUTHORIZED);
        }

        assert_eq!(
            foreign_key_error(Some("ingredient_amounts_ingredient_id_fkey")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(foreign_key_error(None).status(), StatusCode::NOT_FOUND);
    }
}
