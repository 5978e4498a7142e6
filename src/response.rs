//! The (status, payload) pair every endpoint layer produces.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

/// Status plus optional JSON payload. Decorators may inspect or replace both.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub payload: Option<Value>,
}

impl Reply {
    pub fn ok(payload: Value) -> Self {
        Self::with_status(StatusCode::OK, payload)
    }

    pub fn created(payload: Value) -> Self {
        Self::with_status(StatusCode::CREATED, payload)
    }

    pub fn no_content() -> Self {
        Reply {
            status: StatusCode::NO_CONTENT,
            payload: None,
        }
    }

    pub fn with_status(status: StatusCode, payload: Value) -> Self {
        Reply {
            status,
            payload: Some(payload),
        }
    }

    /// Number of elements when the payload is a collection.
    pub fn collection_len(&self) -> Option<usize> {
        self.payload.as_ref().and_then(Value::as_array).map(Vec::len)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self.payload {
            Some(payload) => (self.status, Json(payload)).into_response(),
            None => self.status.into_response(),
        }
    }
}
