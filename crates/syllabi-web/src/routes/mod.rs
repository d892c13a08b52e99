pub mod api;
pub mod pages;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::{Html, Json};
use axum::routing::get;
use axum::Router;
use syllabi_core::config::WebConfig;
use syllabi_core::generation::CurriculumGenerator;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::AppState;

/// The full application: routes, state, and the CORS policy.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.web);
    router().with_state(state).layer(cors)
}

/// Cross-origin access is granted only to pages served by this server.
/// The API acts on the signed-in user's data, so other sites get no CORS headers.
pub fn cors_layer(web: &WebConfig) -> CorsLayer {
    let mut origins = vec![format!("http://{}:{}", web.host, web.port)];
    if matches!(web.host.as_str(), "127.0.0.1" | "0.0.0.0" | "localhost") {
        origins.push(format!("http://localhost:{}", web.port));
        origins.push(format!("http://127.0.0.1:{}", web.port));
    }
    origins.sort();
    origins.dedup();

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("skipping CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(pages::routes())
        .merge(api::routes())
        .fallback(not_found)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let wb = &state.workbench;
    Json(serde_json::json!({
        "status": "ok",
        "generator": wb.generator().describe(),
        "storage_backend": state.config.storage.backend,
        "signed_in": wb.session().is_some(),
        "generating": wb.is_generating(),
    }))
}

async fn not_found() -> (axum::http::StatusCode, Html<String>) {
    let body = r#"<!doctype html>
<html><head><title>404 · Syllabi</title>
<style>body{font-family:system-ui;background:#f7f5f0;color:#2b2b2b;display:flex;justify-content:center;align-items:center;height:100vh;margin:0}
.box{text-align:center}
h1{font-size:4rem;color:#2c5f8a;margin:0}
p{color:#777;margin:0.5rem 0 1.5rem}
a{color:#2c5f8a;text-decoration:none;padding:0.5rem 1rem;border:1px solid #d8d2c4;border-radius:8px}
a:hover{border-color:#2c5f8a}</style>
</head><body><div class="box"><h1>404</h1><p>This page doesn't exist.</p><a href="/">Back to the workbench</a></div></body></html>"#;
    (axum::http::StatusCode::NOT_FOUND, Html(body.to_string()))
}
