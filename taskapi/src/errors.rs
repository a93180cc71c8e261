//! # Error handling for the API
//!
//! Every handler returns `Result<_, ApiError>`. Each variant maps to one
//! HTTP status and renders the shared error envelope:
//!
//! ```json
//! {"success": false, "message": "Validation error", "errors": {"title": ["The title is mandatory"]}}
//! ```
//!
//! Database and internal failures are logged through `tracing` with their
//! details and reach the client only as a generic message.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use utoipa::ToSchema;

/// Field name → messages, in field order.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found
    NotFound {
        /// Resource type, e.g. "Task"
        resource: String,
        id: Option<String>,
    },

    /// 400 Bad Request: the body could not be read at all.
    BadRequest { message: String },

    /// 401 Unauthorized: missing or unknown bearer token.
    Unauthorized { message: String },

    /// 403 Forbidden: authenticated, but not allowed on this resource.
    Forbidden { message: String },

    /// 409 Conflict
    Conflict { message: String },

    /// 422 Unprocessable Entity
    ValidationFailed { errors: FieldErrors },

    /// 429 Too Many Requests
    TooManyRequests { message: String },

    /// 500, details logged and not sent
    Database { internal: DbErr },

    /// 500, details logged and not sent
    Internal {
        message: String,
        internal: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// The 401 every protected route answers with.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::unauthorized("Unauthenticated")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn validation_failed(errors: FieldErrors) -> Self {
        Self::ValidationFailed { errors }
    }

    /// A 422 carrying a single message for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        Self::ValidationFailed { errors }
    }

    #[must_use]
    pub fn too_many_requests() -> Self {
        Self::TooManyRequests {
            message: "Too many requests".to_owned(),
        }
    }

    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database { internal: err }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The sanitized message sent to clients.
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Conflict { message }
            | Self::TooManyRequests { message }
            | Self::Internal { message, .. } => message.clone(),
            Self::ValidationFailed { .. } => "Validation error".to_owned(),
            Self::Database { .. } => "Database error".to_owned(),
        }
    }

    fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            Self::ValidationFailed { errors } if !errors.is_empty() => Some(errors.clone()),
            Self::TooManyRequests { .. } => Some(FieldErrors::from([(
                "rate_limit".to_owned(),
                vec!["You have exceeded the limit of allowed requests".to_owned()],
            )])),
            _ => None,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error envelope sent to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = ErrorResponse {
            success: false,
            message: self.user_message(),
            errors: self.field_errors(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// `RecordNotFound` becomes a 404, a unique violation a 409, everything
/// else a logged 500.
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(details)) = err.sql_err() {
            tracing::debug!(details = %details, "unique constraint violated");
            return Self::conflict("The resource already exists");
        }
        match err {
            DbErr::RecordNotFound(_) => Self::not_found("Resource", None),
            other => Self::database(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
