//! The generation collaborator: turns structural parameters (plus optional
//! refinement feedback and the prior version) into curriculum content.
//!
//! Implementations:
//! - [`LlmGenerator`]: prompts a configured LLM provider for a JSON document
//! - [`OfflineGenerator`]: deterministic skeleton built from the request, no network
//!
//! [`Generator`] dispatches between them so front-ends can hold one concrete type.

use std::fmt::Write as _;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::llm::LlmService;
use crate::model::*;

/// One call to the collaborator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub request: CurriculumRequest,
    pub feedback: Option<String>,
    pub prior: Option<CurriculumArtifact>,
}

impl GenerationRequest {
    pub fn initial(request: CurriculumRequest) -> Self {
        Self {
            request,
            feedback: None,
            prior: None,
        }
    }

    pub fn refinement(
        request: CurriculumRequest,
        feedback: String,
        prior: CurriculumArtifact,
    ) -> Self {
        Self {
            request,
            feedback: Some(feedback),
            prior: Some(prior),
        }
    }
}

pub type GenerationResult = std::result::Result<GeneratedContent, GenerationError>;

/// Produces curriculum content. Only this call may suspend in a session.
pub trait CurriculumGenerator: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = GenerationResult> + Send;

    /// Short identifier for status output, e.g. `gemini/gemini-1.5-flash`.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// LLM-backed generator
// ---------------------------------------------------------------------------

/// System instruction sent with every generation call.
const SYSTEM_INSTRUCTION: &str = r#"You are an elite Academic Intelligence Consultant and Curriculum Designer.
Your objective is to automate the creation of high-impact curricula that bridge the gap between education and current industry requirements.

MANDATORY RULES:
1. BLOOM'S TAXONOMY: Map learning outcomes across all six levels: Knowledge, Comprehension, Application, Analysis, Synthesis, and Evaluation.
2. INDUSTRY MODE: Strictly tailor modules to the selected mode (Startup: rapid prototyping; Corporate: best practices/compliance; Research: foundational depth).
3. SKILL GAPS: Explicitly identify what traditional curricula lack in this subject and how YOUR version solves it.
4. JOB ROLES: List modern, high-paying roles relevant to the next 5 years.
5. CAPSTONES: Projects must be "Resume-Grade" with specific tech stacks.
6. FORMAT: Respond ONLY with a single valid JSON object following the schema below. No conversational text, no markdown fences.

SCHEMA:
{
  "description": string,
  "objectives": [string],
  "modules": [{"week": number, "topic": string, "content": string}],
  "learningOutcomes": [{"level": "Knowledge"|"Comprehension"|"Application"|"Analysis"|"Synthesis"|"Evaluation", "outcome": string}],
  "assessmentMethods": [string],
  "toolsAndTech": [string],
  "jobRoles": [string],
  "skillMapping": [string],
  "skillGaps": [{"area": string, "gapDescription": string, "mitigationStrategy": string}],
  "capstoneProjects": [{"title": string, "description": string, "techStack": [string], "deliverables": [string]}],
  "intelligenceScores": {"academicDepth": 0-100, "industryRelevance": 0-100, "bloomsCoverage": 0-100, "practicalBalance": 0-100, "innovationScore": 0-100}
}"#;

/// Generator that prompts an LLM provider for a JSON curriculum document.
#[derive(Debug)]
pub struct LlmGenerator {
    llm: LlmService,
}

impl LlmGenerator {
    pub fn new(llm: LlmService) -> Self {
        Self { llm }
    }

    pub fn from_config(config: &LlmConfig) -> std::result::Result<Self, GenerationError> {
        Ok(Self::new(LlmService::from_config(config)?))
    }
}

impl CurriculumGenerator for LlmGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let prompt = build_prompt(request);
        let response = self
            .llm
            .generate_json(&prompt, Some(SYSTEM_INSTRUCTION))
            .await?;
        parse_content(&response)
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.llm.provider_name(), self.llm.model())
    }
}

/// Build the user prompt for a (re)generation call.
pub(crate) fn build_prompt(request: &GenerationRequest) -> String {
    let r = &request.request;
    let mut prompt = format!(
        "Generate a comprehensive academic curriculum and intelligence report for:\n\
         Course Name: {}\n\
         Subject Area: {}\n\
         Academic Level: {}\n\
         Duration: {} weeks\n\
         Credit Hours: {}\n\
         Industry Mode: {} ({})\n\
         Industry Focus: {}\n\
         Teaching Type: {}\n",
        r.course_name,
        r.subject_area,
        r.academic_level,
        r.duration_weeks,
        r.credit_hours,
        r.mode,
        r.mode.description(),
        r.industry_focus,
        r.teaching_type,
    );

    if let Some(feedback) = request.feedback.as_deref() {
        let _ = write!(prompt, "\nUSER REFINEMENT REQUEST: \"{}\"\n", feedback.trim());
    }

    if let Some(prior) = &request.prior {
        let _ = writeln!(prompt, "\nBASED ON PREVIOUS DATA VERSION: {}", prior.id);
        prompt.push_str("Previous weekly modules (keep what the refinement request does not change):\n");
        for module in &prior.content.modules {
            let _ = writeln!(prompt, "  Week {}: {}", module.week, module.topic);
        }
    }

    let _ = write!(
        prompt,
        "\nPlease provide:\n\
         1. Executive Summary & Objectives.\n\
         2. Weekly Modules (Week, Topic, Deep-dive Content) covering all {} weeks.\n\
         3. Bloom's Taxonomy mapping: Generate 12-15 diverse learning outcomes spanning all levels.\n\
         4. Assessment strategies & specific Industry Tools.\n\
         5. 5 Detailed Capstone Projects with Tech Stacks.\n\
         6. Intelligence Scores (0-100).\n\
         7. Job Roles: List 5-7 modern roles this prepares for.\n\
         8. Skill Gaps: Identify 3-4 potential skill gaps in traditional curricula that THIS curriculum fixes.\n\
         9. Skill Mapping: Matrix of industry skills.",
        r.duration_weeks,
    );

    prompt
}

/// Parse the LLM's JSON document into [`GeneratedContent`].
pub(crate) fn parse_content(response: &str) -> GenerationResult {
    // Strip markdown fences if present
    let cleaned = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if cleaned.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty response text".into(),
        ));
    }

    let mut content: GeneratedContent = serde_json::from_str(cleaned)
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON from LLM: {e}")))?;

    if content.modules.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "response contains no modules".into(),
        ));
    }
    content.modules.sort_by_key(|m| m.week);

    Ok(content)
}

// ---------------------------------------------------------------------------
// Offline generator
// ---------------------------------------------------------------------------

/// Deterministic generator that needs no API key. Produces a structurally
/// complete curriculum skeleton from the request alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGenerator;

impl CurriculumGenerator for OfflineGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        Ok(offline_content(request))
    }

    fn describe(&self) -> String {
        "offline".to_string()
    }
}

const PHASES: [&str; 4] = ["Foundations", "Core Techniques", "Applied Practice", "Integration"];

fn offline_content(request: &GenerationRequest) -> GeneratedContent {
    let r = &request.request;
    let weeks = r.duration_weeks.max(1);
    let course = r.course_name.trim();

    let modules = (1..=weeks)
        .map(|week| {
            let phase = PHASES[((week - 1) * PHASES.len() as u32 / weeks) as usize];
            Module {
                week,
                topic: format!("{course}: {phase} {week}"),
                content: format!(
                    "{phase} of {course} for {} learners, delivered as {} with a {} lens on {}.",
                    r.academic_level,
                    r.teaching_type.to_lowercase(),
                    r.mode.to_string().to_lowercase(),
                    r.industry_focus,
                ),
            }
        })
        .collect();

    let learning_outcomes = BloomLevel::ALL
        .iter()
        .map(|level| LearningOutcome {
            level: *level,
            outcome: match level {
                BloomLevel::Knowledge => format!("Recall the core vocabulary of {course}."),
                BloomLevel::Comprehension => {
                    format!("Explain how {course} concepts apply in {}.", r.industry_focus)
                }
                BloomLevel::Application => {
                    format!("Apply {course} techniques to a realistic brief.")
                }
                BloomLevel::Analysis => format!("Analyse trade-offs between {course} approaches."),
                BloomLevel::Synthesis => format!("Design an end-to-end {course} solution."),
                BloomLevel::Evaluation => {
                    format!("Evaluate {course} solutions against industry criteria.")
                }
            },
        })
        .collect();

    let (practical, depth, innovation) = match r.mode {
        IndustryMode::Startup => (85u8, 60u8, 90u8),
        IndustryMode::Corporate => (75, 70, 65),
        IndustryMode::Research => (55, 92, 80),
    };
    let practical = match r.teaching_type.as_str() {
        "Practical" | "Lab-centric" | "Project-based" => (practical + 10).min(100),
        "Theory" | "Seminar-based" => practical.saturating_sub(15),
        _ => practical,
    };

    let mut objectives = vec![
        format!("Build a working command of {course} at {} level.", r.academic_level),
        format!("Connect {course} practice to {} needs.", r.industry_focus),
    ];
    if let Some(feedback) = request.feedback.as_deref() {
        objectives.push(format!("Refinement: {}", feedback.trim()));
    }

    GeneratedContent {
        description: format!(
            "A {weeks}-week, {}-credit {} course in {} ({}), oriented to {} settings.",
            r.credit_hours, r.teaching_type, course, r.subject_area, r.mode,
        ),
        objectives,
        modules,
        learning_outcomes,
        assessment_methods: vec![
            "Weekly practical exercises".to_string(),
            "Mid-term project review".to_string(),
            "Capstone presentation".to_string(),
        ],
        tools_and_tech: vec!["Git".to_string(), "Jupyter".to_string()],
        job_roles: vec![format!("{course} Specialist"), format!("{course} Analyst")],
        skill_mapping: vec![format!("{course} fundamentals -> {}", r.industry_focus)],
        skill_gaps: vec![SkillGap {
            area: "Industry exposure".to_string(),
            gap_description: "Traditional courses stop at theory.".to_string(),
            mitigation_strategy: format!("Weekly applied work framed by {}.", r.industry_focus),
        }],
        capstone_projects: vec![CapstoneProject {
            title: format!("{course} Capstone"),
            description: format!("An end-to-end {course} project for a {} client.", r.industry_focus),
            tech_stack: vec!["Git".to_string()],
            deliverables: vec!["Working prototype".to_string(), "Technical report".to_string()],
        }],
        intelligence_scores: IntelligenceScores {
            academic_depth: depth,
            industry_relevance: 80,
            blooms_coverage: 100,
            practical_balance: practical,
            innovation_score: innovation,
        },
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Enum wrapper for generators. Dispatches to the concrete implementation.
/// Using an enum instead of `Box<dyn CurriculumGenerator>` because the trait uses RPITIT.
#[derive(Debug)]
pub enum Generator {
    Llm(LlmGenerator),
    Offline(OfflineGenerator),
}

impl CurriculumGenerator for Generator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        match self {
            Generator::Llm(g) => g.generate(request).await,
            Generator::Offline(g) => g.generate(request).await,
        }
    }

    fn describe(&self) -> String {
        match self {
            Generator::Llm(g) => g.describe(),
            Generator::Offline(g) => g.describe(),
        }
    }
}

/// Create a generator from configuration. `provider = "offline"` needs no key.
pub fn create_generator(config: &LlmConfig) -> std::result::Result<Generator, GenerationError> {
    if config.provider == "offline" {
        return Ok(Generator::Offline(OfflineGenerator));
    }
    Ok(Generator::Llm(LlmGenerator::from_config(config)?))
}
