use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Central error type for the UDF adapter.
///
/// `SymbolNotFound` and `InvalidResolution` are domain-expected conditions
/// with fixed UDF responses. Everything upstream-related collapses to a
/// generic 500 at the boundary; the original code/message is logged.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Symbol Not Found")]
    SymbolNotFound,

    #[error("Invalid Resolution")]
    InvalidResolution,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("upstream failure: {message}")]
    Upstream { code: Option<i64>, message: String },

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Upstream failure without an exchange-reported error code.
    pub fn upstream(message: impl Into<String>) -> Self {
        Error::Upstream {
            code: None,
            message: message.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, errmsg) = match self {
            Error::SymbolNotFound => (StatusCode::NOT_FOUND, "Symbol Not Found".to_string()),
            Error::InvalidResolution => {
                (StatusCode::BAD_REQUEST, "Invalid Resolution".to_string())
            }
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Upstream { code, message } => {
                tracing::error!(?code, %message, "upstream request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error".to_string())
            }
            Error::Internal(err) => {
                tracing::error!(%err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error".to_string())
            }
        };

        let body = Json(json!({
            "s": "error",
            "errmsg": errmsg
        }));

        (status, body).into_response()
    }
}
