//! Types shared with API clients

use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// Opaque wrapper for any error that escapes a handler.
pub struct ApiError(anyhow::Error);

/// Any handler error becomes a logged 500. Recoverable chat failures
/// never reach this point, the orchestrator folds them into the reply.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self.0),
        )
            .into_response()
    }
}

/// Lets handlers use `?` on anything convertible to `anyhow::Error`.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Request and response bodies, re-exported per route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}
