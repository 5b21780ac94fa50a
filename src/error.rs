/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - validation / store / JSON body error を統一的に変換
 *
 * 401 / 403 / 404 は body なし (front end は status だけを見る)
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::schema::ValidationError;
use crate::services::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    /// A request the extractors refused for a reason other than bad JSON (413, 415, ...).
    #[error("{status}: {message}")]
    Rejected {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn payload_too_large() -> Self {
        Self::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            code: "PAYLOAD_TOO_LARGE",
            message: "request body is too large".into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Rejected { status, .. } => *status,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            AppError::Unauthorized | AppError::Forbidden | AppError::NotFound { .. } => {
                return status.into_response();
            }
            AppError::BadRequest { code, message } => (code, message),
            AppError::Rejected { code, message, .. } => (code, message),
            AppError::Internal => ("INTERNAL_SERVER_ERROR", "internal server error".into()),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        let code = match e {
            ValidationError::UnknownParameter(_) | ValidationError::InvalidParameter { .. } => {
                "INVALID_QUERY"
            }
            _ => "VALIDATION_ERROR",
        };
        AppError::bad_request(code, e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        // Log the real error but return a generic message
        tracing::error!(error = ?e, "document store failure");
        AppError::Internal
    }
}

// keeps axum's status (413 oversized body, 415 wrong content type, ...)
impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        let status = e.status();
        let code = match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => "INVALID_JSON",
            StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
            StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
            _ => "INVALID_BODY",
        };

        if status == StatusCode::BAD_REQUEST {
            return AppError::bad_request(code, e.body_text());
        }

        AppError::Rejected {
            status,
            code,
            message: e.body_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auth_and_lookup_errors_have_no_body() {
        for (err, status) in [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::Forbidden, StatusCode::FORBIDDEN),
            (AppError::not_found("todos"), StatusCode::NOT_FOUND),
        ] {
            let res = err.into_response();
            assert_eq!(res.status(), status);
            let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn validation_errors_render_a_json_body() {
        let res = AppError::from(ValidationError::Missing("content")).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "content is required");
    }

    #[tokio::test]
    async fn json_rejections_keep_their_status() {
        use axum::{Json, body::Body, extract::FromRequest, http::Request};

        let req = Request::builder()
            .method("PUT")
            .uri("/todos/x")
            .body(Body::from(r#"{"content":"x"}"#))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(req, &())
            .await
            .unwrap_err();

        let err = AppError::from(rejection);
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let res = err.into_response();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
    }
}
