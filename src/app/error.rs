use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use super::views;

/// Errors surfaced by the route handlers.
///
/// Every variant renders as a small HTML error page; nothing propagates
/// past the handler.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Upstream OAuth or accounting API call failed.
    #[error(transparent)]
    Upstream(#[from] crate::error::Error),

    /// The provider redirect could not be completed; the detail is shown to the user.
    #[error("{0}")]
    Callback(String),

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    Store(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Callback(ref detail) => {
                tracing::warn!(error = %detail, "OAuth callback failed");
                (StatusCode::BAD_REQUEST, Html(views::error_with_detail(detail))).into_response()
            }
            Self::Upstream(ref e) => {
                tracing::error!(error = %e, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, Html(views::error())).into_response()
            }
            Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error())).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_variant() {
        let upstream = AppError::from(crate::error::Error::Token("bad".into()));
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::Callback("state mismatch".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store("down".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
