//! Typed errors and HTTP mapping.

use crate::filter::FilterError;
use crate::response::Reply;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Setup-time failures. Never produced while serving a request.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("entity '{entity}' has no fields")]
    NoFields { entity: String },
    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },
    #[error("entity '{0}' has an empty primary key")]
    EmptyPrimaryKey(String),
    #[error("invalid primary key: entity {entity} column {column}")]
    InvalidPrimaryKey { entity: String, column: String },
    #[error("primary key of entity {entity} lists column {column} more than once")]
    DuplicatePrimaryKey { entity: String, column: String },
    #[error("invalid autoincrement field: entity {entity} column {column}: {reason}")]
    InvalidAutoincrement {
        entity: String,
        column: String,
        reason: &'static str,
    },
    #[error("unique index on entity {entity} references unknown column {column}")]
    InvalidUniqueIndex { entity: String, column: String },
    #[error("entity name already registered: {0}")]
    DuplicateEntity(String),
    #[error("route already registered: {method} {path}")]
    DuplicateRoute { method: String, path: String },
    #[error("decorator '{name}' listed more than once on {method} {path}")]
    DuplicateDecorator {
        name: &'static str,
        method: String,
        path: String,
    },
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("unknown operation '{operation}' on entity {entity}")]
    UnknownOperation { entity: String, operation: String },
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Failures reported by a record store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        StoreError::Backend(e.to_string())
    }
}

/// Request-time outcomes. Each maps to a status and a structured body.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("validation: {0}")]
    Validation(String),
    #[error("store: {0}")]
    Store(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Backend(msg) => AppError::Store(msg),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Machine-readable code placed in the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Filter(_) => "filter_error",
            AppError::Validation(_) => "validation_error",
            AppError::Store(_) => "store_error",
        }
    }

    /// Default status. `NotFound` stays in the bad-request class unless an
    /// endpoint installs [`crate::ErrorMapper::distinct_not_found`].
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::BadRequest(_) | AppError::Filter(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Filter(e) => Some(serde_json::json!({
                "token": e.token,
                "position": e.position,
            })),
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        }
    }

    /// Default (status, payload) pair used at the transport boundary.
    pub fn to_reply(&self) -> Reply {
        let payload = serde_json::to_value(self.body()).unwrap_or(serde_json::Value::Null);
        Reply::with_status(self.status(), payload)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
