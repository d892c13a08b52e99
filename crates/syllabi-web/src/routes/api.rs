use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use syllabi_core::advisory::{self, Advisory};
use syllabi_core::export;
use syllabi_core::model::*;
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/curricula", post(create_curriculum))
        .route(
            "/api/v1/curricula/current",
            get(current_curriculum).patch(edit_curriculum),
        )
        .route(
            "/api/v1/curricula/current/regenerate",
            post(regenerate_curriculum),
        )
        .route(
            "/api/v1/curricula/current/export.md",
            get(export_markdown),
        )
        .route("/api/v1/curricula/{id}/select", post(select_curriculum))
        .route("/api/v1/history", get(list_history))
        .route("/api/v1/history/{id}", delete(delete_history))
        .route("/api/v1/advisory", get(credit_advisory))
        .route("/api/v1/catalog", get(catalog))
}

// -- Request/Response types --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Form fields for a new curriculum. Anything omitted takes the form default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCurriculumRequest {
    pub course_name: String,
    pub mode: IndustryMode,
    #[serde(default)]
    pub subject_area: Option<String>,
    #[serde(default)]
    pub academic_level: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub credit_hours: Option<u32>,
    #[serde(default)]
    pub industry_focus: Option<String>,
    #[serde(default)]
    pub teaching_type: Option<String>,
}

impl CreateCurriculumRequest {
    pub fn into_request(self) -> CurriculumRequest {
        let mut request = CurriculumRequest::new(self.course_name, self.mode);
        if let Some(v) = self.subject_area {
            request = request.with_subject_area(v);
        }
        if let Some(v) = self.academic_level {
            request = request.with_academic_level(v);
        }
        if let Some(v) = self.duration_weeks {
            request = request.with_duration(v);
        }
        if let Some(v) = self.credit_hours {
            request = request.with_credits(v);
        }
        if let Some(v) = self.industry_focus {
            request = request.with_industry_focus(v);
        }
        if let Some(v) = self.teaching_type {
            request = request.with_teaching_type(v);
        }
        request
    }
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvisoryQuery {
    pub weeks: u32,
    pub credits: u32,
}

#[derive(Debug, Serialize)]
pub struct AdvisoryResponse {
    pub advisory: Option<Advisory>,
}

#[derive(Debug, Serialize)]
pub struct ModeOption {
    pub mode: IndustryMode,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub course_titles: &'static [&'static str],
    pub subject_areas: &'static [&'static str],
    pub academic_levels: &'static [&'static str],
    pub teaching_types: &'static [&'static str],
    pub industry_focus: &'static [&'static str],
    pub modes: Vec<ModeOption>,
}

// -- Handlers --

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .workbench
        .register(&req.name, &req.email, &req.password)
        .await?;
    Ok(Json(session))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.workbench.login(&req.email, &req.password).await?;
    Ok(Json(session))
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    state.workbench.logout().await?;
    Ok(Json(serde_json::json!({ "signed_out": true })))
}

async fn me(State(state): State<Arc<AppState>>) -> Result<Json<Session>, ApiError> {
    state
        .workbench
        .session()
        .map(Json)
        .ok_or_else(|| syllabi_core::SyllabiError::NotAuthenticated.into())
}

async fn create_curriculum(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCurriculumRequest>,
) -> Result<Json<CurriculumArtifact>, ApiError> {
    let artifact = state.workbench.create(req.into_request()).await?;
    Ok(Json(artifact))
}

async fn current_curriculum(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CurriculumArtifact>, ApiError> {
    Ok(Json(state.workbench.require_current()?))
}

async fn regenerate_curriculum(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegenerateRequest>,
) -> Result<Json<CurriculumArtifact>, ApiError> {
    let artifact = state.workbench.regenerate(&req.feedback).await?;
    Ok(Json(artifact))
}

async fn edit_curriculum(
    State(state): State<Arc<AppState>>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<CurriculumArtifact>, ApiError> {
    let artifact = state.workbench.edit_field(&edit).await?;
    Ok(Json(artifact))
}

async fn select_curriculum(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CurriculumArtifact>, ApiError> {
    let artifact = state.workbench.select(id).await?;
    Ok(Json(artifact))
}

async fn export_markdown(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let artifact = state.workbench.require_current()?;
    let file_name = export::export_file_name(&artifact, "md");
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export::render_markdown(&artifact),
    )
        .into_response())
}

async fn list_history(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CurriculumArtifact>>, ApiError> {
    Ok(Json(state.workbench.history()?))
}

async fn delete_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CurriculumArtifact>>, ApiError> {
    Ok(Json(state.workbench.delete(id).await?))
}

async fn credit_advisory(
    Query(query): Query<AdvisoryQuery>,
) -> Result<Json<AdvisoryResponse>, ApiError> {
    if query.weeks == 0 || query.credits == 0 {
        return Err(ApiError::bad_request("weeks and credits must be positive"));
    }
    Ok(Json(AdvisoryResponse {
        advisory: advisory::credit_advisory(query.weeks, query.credits),
    }))
}

async fn catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        course_titles: catalog::COURSE_TITLES,
        subject_areas: catalog::SUBJECT_AREAS,
        academic_levels: catalog::ACADEMIC_LEVELS,
        teaching_types: catalog::TEACHING_TYPES,
        industry_focus: catalog::INDUSTRY_FOCUS_OPTIONS,
        modes: IndustryMode::ALL
            .iter()
            .map(|mode| ModeOption {
                mode: *mode,
                description: mode.description(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use syllabi_core::config::SyllabiConfig;
    use syllabi_core::generation::{Generator, OfflineGenerator};
    use syllabi_core::storage::{MemoryStorage, Storage};
    use syllabi_core::Workbench;
    use tower::ServiceExt;

    fn test_app_state() -> Arc<AppState> {
        let config = SyllabiConfig::default_config();
        Arc::new(AppState {
            workbench: Workbench::new(
                Storage::Memory(MemoryStorage::new()),
                Generator::Offline(OfflineGenerator),
                config.history.max_entries,
            ),
            config,
        })
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = crate::routes::router().with_state(Arc::clone(state));
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        (status, body_json(resp.into_body()).await)
    }

    async fn signed_in_state() -> Arc<AppState> {
        let state = test_app_state();
        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/auth/register",
                serde_json::json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "password": "Abc123!@"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        state
    }

    fn create_body() -> serde_json::Value {
        serde_json::json!({
            "courseName": "Data Science & ML",
            "mode": "Corporate",
            "durationWeeks": 12,
            "creditHours": 4
        })
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateCurriculumRequest =
            serde_json::from_str(r#"{"courseName": "Robotics", "mode": "research"}"#).unwrap();
        let request = req.into_request();
        assert_eq!(request.course_name, "Robotics");
        assert_eq!(request.duration_weeks, 12);
        assert_eq!(request.credit_hours, 4);
        assert_eq!(request.mode, IndustryMode::Research);
        assert_eq!(request.academic_level, catalog::ACADEMIC_LEVELS[0]);
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_app_state();
        let (status, json) = send(&state, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["signed_in"], false);
    }

    #[tokio::test]
    async fn test_curricula_require_sign_in() {
        let state = test_app_state();
        let (status, json) = send(
            &state,
            json_request("POST", "/api/v1/curricula", create_body()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(json["error"].as_str().unwrap().contains("not signed in"));

        let (status, _) = send(&state, get_request("/api/v1/history")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&state, get_request("/api/v1/auth/me")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_rules() {
        let state = test_app_state();
        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/auth/register",
                serde_json::json!({"name": "Ada", "email": "ada@example.com", "password": "abc12345"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let state = signed_in_state().await;
        let (status, json) = send(&state, get_request("/api/v1/auth/me")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["user"]["email"], "ada@example.com");

        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/auth/register",
                serde_json::json!({"name": "Other", "email": "ada@example.com", "password": "Zz999!!zz"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/auth/login",
                serde_json::json!({"email": "ada@example.com", "password": "wrong-pass"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_refine_edit_flow() {
        let state = signed_in_state().await;

        let (status, created) = send(
            &state,
            json_request("POST", "/api/v1/curricula", create_body()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["courseName"], "Data Science & ML");
        assert_eq!(created["modules"].as_array().unwrap().len(), 12);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, refined) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/curricula/current/regenerate",
                serde_json::json!({"feedback": "add more labs"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(refined["id"], id.as_str());

        let (status, edited) = send(
            &state,
            json_request(
                "PATCH",
                "/api/v1/curricula/current",
                serde_json::json!({"field": "module_topic", "index": 0, "value": "Orientation"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["modules"][0]["topic"], "Orientation");

        let (status, _) = send(
            &state,
            json_request(
                "PATCH",
                "/api/v1/curricula/current",
                serde_json::json!({"field": "module_content", "index": 99, "value": "x"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, history) = send(&state, get_request("/api/v1/history")).await;
        assert_eq!(status, StatusCode::OK);
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["id"], id.as_str());
        assert_eq!(history[0]["modules"][0]["topic"], "Orientation");
    }

    #[tokio::test]
    async fn test_current_without_artifact() {
        let state = signed_in_state().await;
        let (status, _) = send(&state, get_request("/api/v1/curricula/current")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/curricula/current/regenerate",
                serde_json::json!({"feedback": "more labs"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_select_and_delete() {
        let state = signed_in_state().await;
        let (_, first) = send(
            &state,
            json_request("POST", "/api/v1/curricula", create_body()),
        )
        .await;
        let (_, second) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/curricula",
                serde_json::json!({"courseName": "Cloud Computing & DevOps", "mode": "Startup"}),
            ),
        )
        .await;
        let first_id = first["id"].as_str().unwrap();

        let (status, selected) = send(
            &state,
            json_request(
                "POST",
                &format!("/api/v1/curricula/{first_id}/select"),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(selected["id"], first_id);

        let (status, remaining) = send(
            &state,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/history/{first_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let remaining = remaining.as_array().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0]["id"], second["id"]);

        // Deleted entry was current, so nothing is active any more
        let (status, _) = send(&state, get_request("/api/v1/curricula/current")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &state,
            json_request(
                "POST",
                &format!("/api/v1/curricula/{}/select", Uuid::now_v7()),
                serde_json::json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_hides_history_until_login() {
        let state = signed_in_state().await;
        send(
            &state,
            json_request("POST", "/api/v1/curricula", create_body()),
        )
        .await;
        let (_, before) = send(&state, get_request("/api/v1/history")).await;

        let (status, _) = send(
            &state,
            json_request("POST", "/api/v1/auth/logout", serde_json::json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&state, get_request("/api/v1/history")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/auth/login",
                serde_json::json!({"email": "ada@example.com", "password": "Abc123!@"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, after) = send(&state, get_request("/api/v1/history")).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_export_markdown() {
        let state = signed_in_state().await;
        send(
            &state,
            json_request("POST", "/api/v1/curricula", create_body()),
        )
        .await;

        let app = crate::routes::router().with_state(Arc::clone(&state));
        let resp = app
            .oneshot(get_request("/api/v1/curricula/current/export.md"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("Data Science & ML.md"));
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("# Data Science & ML"));
    }

    #[tokio::test]
    async fn test_advisory_endpoint() {
        let state = test_app_state();
        let (status, json) = send(&state, get_request("/api/v1/advisory?weeks=4&credits=8")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["advisory"]["severity"], "warning");

        let (_, json) = send(&state, get_request("/api/v1/advisory?weeks=12&credits=4")).await;
        assert!(json["advisory"].is_null());

        let (status, _) = send(&state, get_request("/api/v1/advisory?weeks=0&credits=4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_catalog_endpoint() {
        let state = test_app_state();
        let (status, json) = send(&state, get_request("/api/v1/catalog")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["course_titles"].as_array().unwrap().len(), 15);
        assert_eq!(json["modes"].as_array().unwrap().len(), 3);
    }
}
