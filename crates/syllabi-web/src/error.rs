use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use syllabi_core::SyllabiError;

/// Application error type that renders as an HTML error page.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("web error: {:#}", self.0);

        let body = format!(
            r#"<!doctype html>
<html><head><title>Error</title>
<style>body{{font-family:system-ui;background:#f7f5f0;color:#2b2b2b;display:flex;justify-content:center;align-items:center;height:100vh;margin:0}}
.err{{background:#fff;padding:2rem;border-radius:8px;border-left:4px solid #c0392b;max-width:600px}}
h1{{color:#c0392b;margin-top:0}}pre{{white-space:pre-wrap;color:#555}}</style>
</head><body><div class="err"><h1>Something went wrong</h1><pre>{}</pre>
<p><a href="/" style="color:#2c5f8a">Back to home</a></p></div></body></html>"#,
            html_escape(&format!("{:#}", self.0))
        );
        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// JSON API error type for REST endpoints.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("api error: {:#}", err);
        Self::internal(format!("{:#}", err))
    }
}

impl From<SyllabiError> for ApiError {
    fn from(err: SyllabiError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!("api error: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

pub fn status_for(err: &SyllabiError) -> StatusCode {
    match err {
        SyllabiError::NotFound(_) | SyllabiError::NoActiveArtifact => StatusCode::NOT_FOUND,
        SyllabiError::DuplicateIdentity | SyllabiError::Busy => StatusCode::CONFLICT,
        SyllabiError::InvalidCredentials | SyllabiError::NotAuthenticated => {
            StatusCode::UNAUTHORIZED
        }
        SyllabiError::WeakPassword(_) | SyllabiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        SyllabiError::GenerationFailed(_) | SyllabiError::RegenerationFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
