//! Fixtures shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::error::{GenerationError, Result};
use crate::generation::{CurriculumGenerator, GenerationRequest, GenerationResult};
use crate::model::*;
use crate::storage::{MemoryStorage, StorageBackend, StorageKey};

pub fn sample_request() -> CurriculumRequest {
    CurriculumRequest::new("Data Science & ML", IndustryMode::Corporate)
        .with_duration(12)
        .with_credits(4)
}

pub fn sample_content(weeks: u32) -> GeneratedContent {
    GeneratedContent {
        description: "A practical data science course.".into(),
        objectives: vec!["Model data".into()],
        modules: (1..=weeks)
            .map(|week| Module {
                week,
                topic: format!("Topic {week}"),
                content: format!("Content {week}"),
            })
            .collect(),
        learning_outcomes: vec![
            LearningOutcome {
                level: BloomLevel::Knowledge,
                outcome: "Recall terms".into(),
            },
            LearningOutcome {
                level: BloomLevel::Application,
                outcome: "Fit a model".into(),
            },
            LearningOutcome {
                level: BloomLevel::Application,
                outcome: "Clean a dataset".into(),
            },
            LearningOutcome {
                level: BloomLevel::Evaluation,
                outcome: "Judge a model".into(),
            },
        ],
        assessment_methods: vec!["Labs".into()],
        tools_and_tech: vec!["Python".into()],
        job_roles: vec!["Data Analyst".into()],
        skill_mapping: vec!["Python -> Analytics".into()],
        skill_gaps: vec![SkillGap {
            area: "MLOps".into(),
            gap_description: "Rarely taught".into(),
            mitigation_strategy: "Deployment labs".into(),
        }],
        capstone_projects: vec![CapstoneProject {
            title: "Churn model".into(),
            description: "Predict churn".into(),
            tech_stack: vec!["Python".into()],
            deliverables: vec!["Notebook".into()],
        }],
        intelligence_scores: IntelligenceScores {
            academic_depth: 70,
            industry_relevance: 90,
            blooms_coverage: 80,
            practical_balance: 85,
            innovation_score: 60,
        },
    }
}

pub fn sample_artifact(weeks: u32) -> CurriculumArtifact {
    CurriculumArtifact::new(sample_request().with_duration(weeks), sample_content(weeks))
}

/// Generator that replays queued results, then falls back to
/// [`sample_content`] sized to the request. Optionally holds every call
/// until a permit is released so tests can observe the in-flight state.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    script: Arc<Mutex<VecDeque<GenerationResult>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
    started: Arc<AtomicUsize>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A generator whose calls block until [`release`](Self::release).
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn push(&self, result: GenerationResult) -> &Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn fail_next(&self, error: GenerationError) -> &Self {
        self.push(Err(error))
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl CurriculumGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.calls.lock().unwrap().push(request.clone());
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(sample_content(request.request.duration_weeks)))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Memory storage whose writes can be parked mid-flight. Clones share state.
#[derive(Clone)]
pub struct HeldStorage {
    inner: Arc<MemoryStorage>,
    holding: Arc<AtomicBool>,
    parked: Arc<AtomicUsize>,
    gate: Arc<Semaphore>,
}

impl HeldStorage {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStorage::new()),
            holding: Arc::new(AtomicBool::new(false)),
            parked: Arc::new(AtomicUsize::new(0)),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    /// Park every following write until [`release`](Self::release).
    pub fn hold_writes(&self) {
        self.holding.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.holding.store(false, Ordering::SeqCst);
        self.gate.add_permits(64);
    }

    pub async fn wait_for_parked_write(&self) {
        while self.parked.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
    }
}

impl StorageBackend for HeldStorage {
    async fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &StorageKey, value: String) -> Result<()> {
        if self.holding.load(Ordering::SeqCst) {
            self.parked.fetch_add(1, Ordering::SeqCst);
            self.gate.acquire().await.unwrap().forget();
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &StorageKey) -> Result<()> {
        self.inner.remove(key).await
    }
}
