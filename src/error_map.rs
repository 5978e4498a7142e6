//! Per-endpoint error mapping, installed innermost around the base handler.

use crate::error::AppError;
use crate::response::Reply;
use axum::http::StatusCode;
use std::fmt;
use std::sync::Arc;

pub type MapFn = Arc<dyn Fn(AppError) -> Result<Reply, AppError> + Send + Sync>;

/// Translates outcomes into replies. An outcome the mapper does not
/// recognize must come back as `Err` so outer decorators still observe it;
/// whatever is left is rendered with [`AppError::to_reply`] at the transport boundary.
#[derive(Clone, Default)]
pub struct ErrorMapper {
    map: Option<MapFn>,
}

impl ErrorMapper {
    /// Recognizes nothing.
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(AppError) -> Result<Reply, AppError> + Send + Sync + 'static,
    {
        ErrorMapper { map: Some(Arc::new(f)) }
    }

    /// `NotFound` becomes 404 with the standard error body; everything else propagates.
    pub fn distinct_not_found() -> Self {
        Self::custom(|err| match err {
            AppError::NotFound(_) => {
                let payload = serde_json::to_value(err.body()).unwrap_or_default();
                Ok(Reply::with_status(StatusCode::NOT_FOUND, payload))
            }
            other => Err(other),
        })
    }

    pub fn apply(&self, err: AppError) -> Result<Reply, AppError> {
        match &self.map {
            Some(f) => f(err),
            None => Err(err),
        }
    }
}

impl fmt::Debug for ErrorMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorMapper").field("custom", &self.map.is_some()).finish()
    }
}
