use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Result, SyllabiError};
use crate::model::catalog;

pub const MAX_COURSE_NAME_LENGTH: usize = 200;
pub const MAX_DURATION_WEEKS: u32 = 104;
pub const MAX_CREDIT_HOURS: u32 = 60;

/// Validate the structural parameters of a generation request.
pub fn validate_request(request: &CurriculumRequest) -> Result<()> {
    let trimmed = request.course_name.trim();
    if trimmed.is_empty() {
        return Err(SyllabiError::InvalidInput("course name cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_COURSE_NAME_LENGTH {
        return Err(SyllabiError::InvalidInput(format!(
            "course name exceeds maximum length of {MAX_COURSE_NAME_LENGTH} characters"
        )));
    }
    if !(1..=MAX_DURATION_WEEKS).contains(&request.duration_weeks) {
        return Err(SyllabiError::InvalidInput(format!(
            "duration must be between 1 and {MAX_DURATION_WEEKS} weeks"
        )));
    }
    if !(1..=MAX_CREDIT_HOURS).contains(&request.credit_hours) {
        return Err(SyllabiError::InvalidInput(format!(
            "credit hours must be between 1 and {MAX_CREDIT_HOURS}"
        )));
    }
    Ok(())
}

/// Structural parameters a curriculum is generated from.
///
/// Copied verbatim onto every artifact; an artifact's request is also what
/// gets replayed when the artifact is refined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumRequest {
    pub course_name: String,
    pub subject_area: String,
    pub academic_level: String,
    pub duration_weeks: u32,
    pub credit_hours: u32,
    pub industry_focus: String,
    pub teaching_type: String,
    pub mode: IndustryMode,
}

impl CurriculumRequest {
    /// A request with the form defaults (12 weeks, 4 credits, first option of
    /// every list) and the given course name and mode.
    pub fn new(course_name: impl Into<String>, mode: IndustryMode) -> Self {
        Self {
            course_name: course_name.into(),
            subject_area: catalog::SUBJECT_AREAS[0].to_string(),
            academic_level: catalog::ACADEMIC_LEVELS[0].to_string(),
            duration_weeks: 12,
            credit_hours: 4,
            industry_focus: catalog::INDUSTRY_FOCUS_OPTIONS[0].to_string(),
            teaching_type: catalog::TEACHING_TYPES[0].to_string(),
            mode,
        }
    }

    pub fn with_duration(mut self, weeks: u32) -> Self {
        self.duration_weeks = weeks;
        self
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credit_hours = credits;
        self
    }

    pub fn with_subject_area(mut self, subject_area: impl Into<String>) -> Self {
        self.subject_area = subject_area.into();
        self
    }

    pub fn with_academic_level(mut self, level: impl Into<String>) -> Self {
        self.academic_level = level.into();
        self
    }

    pub fn with_industry_focus(mut self, focus: impl Into<String>) -> Self {
        self.industry_focus = focus.into();
        self
    }

    pub fn with_teaching_type(mut self, teaching_type: impl Into<String>) -> Self {
        self.teaching_type = teaching_type.into();
        self
    }
}

/// Everything the generation collaborator produces for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub description: String,
    pub objectives: Vec<String>,
    pub modules: Vec<Module>,
    pub learning_outcomes: Vec<LearningOutcome>,
    #[serde(default)]
    pub assessment_methods: Vec<String>,
    #[serde(default)]
    pub tools_and_tech: Vec<String>,
    pub job_roles: Vec<String>,
    #[serde(default)]
    pub skill_mapping: Vec<String>,
    pub skill_gaps: Vec<SkillGap>,
    pub capstone_projects: Vec<CapstoneProject>,
    pub intelligence_scores: IntelligenceScores,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    #[serde(deserialize_with = "lenient_u32")]
    pub week: u32,
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningOutcome {
    pub level: BloomLevel,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub area: String,
    pub gap_description: String,
    pub mitigation_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapstoneProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
}

/// Five heuristic quality scores, each clamped to 0–100 on ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntelligenceScores {
    #[serde(deserialize_with = "score")]
    pub academic_depth: u8,
    #[serde(deserialize_with = "score")]
    pub industry_relevance: u8,
    #[serde(deserialize_with = "score")]
    pub blooms_coverage: u8,
    #[serde(deserialize_with = "score")]
    pub practical_balance: u8,
    #[serde(deserialize_with = "score")]
    pub innovation_score: u8,
}

impl IntelligenceScores {
    /// `(label, score)` pairs in display order.
    pub fn labelled(&self) -> [(&'static str, u8); 5] {
        [
            ("Academic Depth", self.academic_depth),
            ("Industry Relevance", self.industry_relevance),
            ("Bloom's Coverage", self.blooms_coverage),
            ("Practical Balance", self.practical_balance),
            ("Innovation", self.innovation_score),
        ]
    }
}

/// LLMs occasionally emit `3.0` or `"3"` where an integer is expected.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_number(deserializer)?;
    Ok(value.max(0.0).round() as u32)
}

fn score<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_number(deserializer)?;
    Ok(value.clamp(0.0, 100.0).round() as u8)
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(serde::de::Error::custom),
    }
}

/// One generated curriculum plus its identity and structural parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumArtifact {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub request: CurriculumRequest,
    #[serde(flatten)]
    pub content: GeneratedContent,
}

impl CurriculumArtifact {
    /// A brand-new artifact with a fresh id.
    pub fn new(request: CurriculumRequest, content: GeneratedContent) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            request,
            content,
        }
    }

    /// Refresh the last-write time. Never moves backwards and always advances,
    /// so two saves within the same clock tick still order correctly.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.timestamp = if now > self.timestamp {
            now
        } else {
            self.timestamp + Duration::milliseconds(1)
        };
    }

    /// The request that reproduces this artifact's structure.
    pub fn originating_request(&self) -> CurriculumRequest {
        self.request.clone()
    }

    pub fn course_name(&self) -> &str {
        &self.request.course_name
    }
}

/// An in-place edit the user may make to the current artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field")]
pub enum FieldEdit {
    CourseName { value: String },
    ModuleTopic { index: usize, value: String },
    ModuleContent { index: usize, value: String },
}

impl FieldEdit {
    /// Apply the edit. Fails on an out-of-range module index or an empty title.
    pub fn apply(&self, artifact: &mut CurriculumArtifact) -> Result<()> {
        match self {
            Self::CourseName { value } => {
                if value.trim().is_empty() {
                    return Err(SyllabiError::InvalidInput(
                        "course name cannot be empty".into(),
                    ));
                }
                artifact.request.course_name = value.clone();
            }
            Self::ModuleTopic { index, value } => {
                module_mut(artifact, *index)?.topic = value.clone();
            }
            Self::ModuleContent { index, value } => {
                module_mut(artifact, *index)?.content = value.clone();
            }
        }
        Ok(())
    }
}

fn module_mut(artifact: &mut CurriculumArtifact, index: usize) -> Result<&mut Module> {
    let count = artifact.content.modules.len();
    artifact.content.modules.get_mut(index).ok_or_else(|| {
        SyllabiError::InvalidInput(format!(
            "module index {index} out of range (curriculum has {count} modules)"
        ))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndustryMode {
    #[serde(alias = "startup")]
    Startup,
    #[serde(alias = "corporate")]
    Corporate,
    #[serde(alias = "research")]
    Research,
}

impl IndustryMode {
    pub const ALL: [IndustryMode; 3] = [Self::Startup, Self::Corporate, Self::Research];

    /// How the mode biases generated content.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Startup => {
                "Fast-paced, high-risk, multi-disciplinary, practical results focus."
            }
            Self::Corporate => {
                "Standardized, scalable, process-driven, certification-aligned."
            }
            Self::Research => {
                "Theoretical depth, peer-review focused, rigorous experimentation."
            }
        }
    }
}

impl std::fmt::Display for IndustryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Startup => write!(f, "Startup"),
            Self::Corporate => write!(f, "Corporate"),
            Self::Research => write!(f, "Research"),
        }
    }
}

impl std::str::FromStr for IndustryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "startup" => Ok(Self::Startup),
            "corporate" => Ok(Self::Corporate),
            "research" => Ok(Self::Research),
            _ => Err(format!(
                "unknown industry mode: {s} (expected Startup, Corporate, or Research)"
            )),
        }
    }
}

/// Bloom's taxonomy level of a learning outcome, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloomLevel {
    #[serde(alias = "knowledge", alias = "KNOWLEDGE", alias = "Remember")]
    Knowledge,
    #[serde(alias = "comprehension", alias = "COMPREHENSION", alias = "Understand")]
    Comprehension,
    #[serde(alias = "application", alias = "APPLICATION", alias = "Apply")]
    Application,
    #[serde(alias = "analysis", alias = "ANALYSIS", alias = "Analyze")]
    Analysis,
    #[serde(alias = "synthesis", alias = "SYNTHESIS", alias = "Create")]
    Synthesis,
    #[serde(alias = "evaluation", alias = "EVALUATION", alias = "Evaluate")]
    Evaluation,
}

impl BloomLevel {
    pub const ALL: [BloomLevel; 6] = [
        Self::Knowledge,
        Self::Comprehension,
        Self::Application,
        Self::Analysis,
        Self::Synthesis,
        Self::Evaluation,
    ];
}

impl std::fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Knowledge => write!(f, "Knowledge"),
            Self::Comprehension => write!(f, "Comprehension"),
            Self::Application => write!(f, "Application"),
            Self::Analysis => write!(f, "Analysis"),
            Self::Synthesis => write!(f, "Synthesis"),
            Self::Evaluation => write!(f, "Evaluation"),
        }
    }
}

impl std::str::FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "knowledge" => Ok(Self::Knowledge),
            "comprehension" => Ok(Self::Comprehension),
            "application" => Ok(Self::Application),
            "analysis" => Ok(Self::Analysis),
            "synthesis" => Ok(Self::Synthesis),
            "evaluation" => Ok(Self::Evaluation),
            _ => Err(format!("unknown taxonomy level: {s}")),
        }
    }
}
