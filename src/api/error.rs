use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest {
        message: String,
        details: Option<Vec<String>>,
    },

    #[error("{0}")]
    NotFound(&'static str),

    /// `public` goes to the caller, `source` only to the log.
    #[error("{public}: {source:#}")]
    Internal {
        public: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest { message: message.into(), details: None }
    }

    pub fn invalid_data(details: Vec<String>) -> Self {
        ApiError::BadRequest {
            message: "Invalid request data".to_string(),
            details: Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest { message, details: None } => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::BadRequest { message, details: Some(details) } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": message, "details": details })),
            )
                .into_response(),
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal { public, source } => {
                error!(error = %format!("{:#}", source), "{}", public);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": public }))).into_response()
            }
        }
    }
}

/// Tag a storage failure with the message the caller is allowed to see.
pub trait OrInternal<T> {
    fn or_internal(self, public: &'static str) -> Result<T, ApiError>;
}

impl<T> OrInternal<T> for anyhow::Result<T> {
    fn or_internal(self, public: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::Internal { public, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("Webinar not found").into_response().status(), StatusCode::NOT_FOUND);
        let internal: anyhow::Result<()> = Err(anyhow::anyhow!("db locked"));
        let err = internal.or_internal("Failed to fetch webinars").unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
