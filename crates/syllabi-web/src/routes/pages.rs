use std::sync::Arc;

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use syllabi_core::advisory::{self, Severity};
use syllabi_core::export::{self, BloomCoverage};
use syllabi_core::model::*;

use crate::error::AppError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/history", get(history_page))
        .route("/curriculum", get(curriculum_page))
        .route("/curriculum/print", get(print_page))
}

// -- View models --

pub struct ModeOption {
    pub value: String,
    pub description: &'static str,
}

pub struct HistoryRow {
    pub id: String,
    pub course_name: String,
    pub updated: String,
    pub weeks: u32,
    pub credits: u32,
    pub mode: String,
    pub is_current: bool,
}

impl HistoryRow {
    fn new(artifact: &CurriculumArtifact, current: Option<uuid::Uuid>) -> Self {
        Self {
            id: artifact.id.to_string(),
            course_name: artifact.course_name().to_string(),
            updated: artifact.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            weeks: artifact.request.duration_weeks,
            credits: artifact.request.credit_hours,
            mode: artifact.request.mode.to_string(),
            is_current: current == Some(artifact.id),
        }
    }
}

pub struct OutcomeRow {
    pub level: String,
    pub outcome: String,
}

pub struct AdvisoryNote {
    pub css_class: &'static str,
    pub message: String,
}

pub struct ScoreRow {
    pub label: &'static str,
    pub score: u8,
}

pub struct CurriculumView {
    pub id: String,
    pub course_name: String,
    pub summary: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub modules: Vec<Module>,
    pub outcomes: Vec<OutcomeRow>,
    pub coverage: Vec<BloomCoverage>,
    pub scores: Vec<ScoreRow>,
    pub assessment_methods: Vec<String>,
    pub tools_and_tech: Vec<String>,
    pub job_roles: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    pub capstone_projects: Vec<CapstoneProject>,
    pub advisory: Option<AdvisoryNote>,
}

impl From<&CurriculumArtifact> for CurriculumView {
    fn from(artifact: &CurriculumArtifact) -> Self {
        let r = &artifact.request;
        let c = &artifact.content;
        Self {
            id: artifact.id.to_string(),
            course_name: r.course_name.clone(),
            summary: format!(
                "{} · {} · {} weeks · {} credits · {} mode",
                r.subject_area, r.academic_level, r.duration_weeks, r.credit_hours, r.mode
            ),
            description: c.description.clone(),
            objectives: c.objectives.clone(),
            modules: c.modules.clone(),
            outcomes: c
                .learning_outcomes
                .iter()
                .map(|o| OutcomeRow {
                    level: o.level.to_string(),
                    outcome: o.outcome.clone(),
                })
                .collect(),
            coverage: export::bloom_coverage(c),
            scores: c
                .intelligence_scores
                .labelled()
                .into_iter()
                .map(|(label, score)| ScoreRow { label, score })
                .collect(),
            assessment_methods: c.assessment_methods.clone(),
            tools_and_tech: c.tools_and_tech.clone(),
            job_roles: c.job_roles.clone(),
            skill_gaps: c.skill_gaps.clone(),
            capstone_projects: c.capstone_projects.clone(),
            advisory: advisory::credit_advisory(r.duration_weeks, r.credit_hours).map(|a| {
                AdvisoryNote {
                    css_class: match a.severity {
                        Severity::Warning => "warning",
                        Severity::Info => "info",
                    },
                    message: a.message,
                }
            }),
        }
    }
}

// -- Templates --

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    active_page: &'static str,
    user: Option<Profile>,
    generator: String,
    course_titles: &'static [&'static str],
    subject_areas: &'static [&'static str],
    academic_levels: &'static [&'static str],
    teaching_types: &'static [&'static str],
    industry_focus: &'static [&'static str],
    modes: Vec<ModeOption>,
    current: Option<HistoryRow>,
}

#[derive(Template)]
#[template(path = "history.html")]
struct HistoryTemplate {
    active_page: &'static str,
    user: Option<Profile>,
    rows: Vec<HistoryRow>,
}

#[derive(Template)]
#[template(path = "curriculum.html")]
struct CurriculumTemplate {
    active_page: &'static str,
    user: Option<Profile>,
    generating: bool,
    curriculum: Option<CurriculumView>,
}

/// Standalone page; the browser's print dialog handles pagination.
#[derive(Template)]
#[template(path = "print.html")]
struct PrintTemplate {
    c: CurriculumView,
}

// -- Handlers --

async fn home(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    use syllabi_core::generation::CurriculumGenerator;

    let wb = &state.workbench;
    let current = wb
        .current()
        .ok()
        .flatten()
        .map(|a| HistoryRow::new(&a, Some(a.id)));
    let tmpl = HomeTemplate {
        active_page: "home",
        user: wb.session().map(|s| s.user),
        generator: wb.generator().describe(),
        course_titles: catalog::COURSE_TITLES,
        subject_areas: catalog::SUBJECT_AREAS,
        academic_levels: catalog::ACADEMIC_LEVELS,
        teaching_types: catalog::TEACHING_TYPES,
        industry_focus: catalog::INDUSTRY_FOCUS_OPTIONS,
        modes: IndustryMode::ALL
            .iter()
            .map(|mode| ModeOption {
                value: mode.to_string(),
                description: mode.description(),
            })
            .collect(),
        current,
    };
    Ok(Html(tmpl.render()?))
}

async fn history_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let wb = &state.workbench;
    let current = wb.current().ok().flatten().map(|a| a.id);
    let rows = wb
        .history()
        .unwrap_or_default()
        .iter()
        .map(|a| HistoryRow::new(a, current))
        .collect();
    let tmpl = HistoryTemplate {
        active_page: "history",
        user: wb.session().map(|s| s.user),
        rows,
    };
    Ok(Html(tmpl.render()?))
}

async fn curriculum_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let wb = &state.workbench;
    let tmpl = CurriculumTemplate {
        active_page: "curriculum",
        user: wb.session().map(|s| s.user),
        generating: wb.is_generating(),
        curriculum: wb
            .current()
            .ok()
            .flatten()
            .as_ref()
            .map(CurriculumView::from),
    };
    Ok(Html(tmpl.render()?))
}

async fn print_page(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let Some(artifact) = state.workbench.current().ok().flatten() else {
        return Ok(Redirect::to("/curriculum").into_response());
    };
    let tmpl = PrintTemplate {
        c: CurriculumView::from(&artifact),
    };
    Ok(Html(tmpl.render()?).into_response())
}
