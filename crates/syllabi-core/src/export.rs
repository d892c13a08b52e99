//! Markdown rendering of a curriculum and the helpers shared with the web print view.
//!
//! All functions borrow the artifact immutably.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::model::*;

static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]+"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Maximum characters kept from the course name in a file name.
const MAX_STEM_LENGTH: usize = 120;

/// File name for an export, e.g. `Data Science & ML.md`.
pub fn export_file_name(artifact: &CurriculumArtifact, extension: &str) -> String {
    let cleaned = UNSAFE_FILENAME_RE.replace_all(artifact.course_name(), " ");
    let collapsed = WHITESPACE_RE.replace_all(cleaned.trim(), " ");
    let stem: String = collapsed
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .chars()
        .take(MAX_STEM_LENGTH)
        .collect();
    let stem = stem.trim_end();
    let stem = if stem.is_empty() { "Curriculum" } else { stem };
    format!("{stem}.{}", extension.trim_start_matches('.'))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloomCoverage {
    pub level: BloomLevel,
    pub count: usize,
    pub percent: u8,
}

/// Outcome count per taxonomy level, in taxonomy order. Every level is listed.
pub fn bloom_coverage(content: &GeneratedContent) -> Vec<BloomCoverage> {
    let total = content.learning_outcomes.len();
    BloomLevel::ALL
        .iter()
        .map(|level| {
            let count = content
                .learning_outcomes
                .iter()
                .filter(|o| o.level == *level)
                .count();
            let percent = if total == 0 {
                0
            } else {
                ((count as f64 / total as f64) * 100.0).round() as u8
            };
            BloomCoverage {
                level: *level,
                count,
                percent,
            }
        })
        .collect()
}

pub fn render_markdown(artifact: &CurriculumArtifact) -> String {
    let r = &artifact.request;
    let c = &artifact.content;
    let mut out = String::new();

    let _ = writeln!(out, "# {}\n", r.course_name);
    let _ = writeln!(
        out,
        "**{}** · {} · {} weeks · {} credits · {} mode · {} · {}\n",
        r.subject_area,
        r.academic_level,
        r.duration_weeks,
        r.credit_hours,
        r.mode,
        r.industry_focus,
        r.teaching_type,
    );
    let _ = writeln!(out, "_Version {} · {}_\n", artifact.id, artifact.timestamp.to_rfc3339());
    let _ = writeln!(out, "{}\n", c.description);

    out.push_str("## Intelligence Scores\n\n| Metric | Score |\n|---|---|\n");
    for (label, score) in c.intelligence_scores.labelled() {
        let _ = writeln!(out, "| {label} | {score} |");
    }
    out.push('\n');

    bullet_section(&mut out, "Objectives", &c.objectives);

    out.push_str("## Weekly Syllabus\n\n");
    for module in &c.modules {
        let _ = writeln!(out, "### Week {}: {}\n\n{}\n", module.week, module.topic, module.content);
    }

    out.push_str("## Bloom's Taxonomy Coverage\n\n| Level | Outcomes | Share |\n|---|---|---|\n");
    for row in bloom_coverage(c) {
        let _ = writeln!(out, "| {} | {} | {}% |", row.level, row.count, row.percent);
    }
    out.push('\n');
    for level in BloomLevel::ALL {
        let outcomes: Vec<_> = c
            .learning_outcomes
            .iter()
            .filter(|o| o.level == level)
            .collect();
        if outcomes.is_empty() {
            continue;
        }
        let _ = writeln!(out, "**{level}**\n");
        for o in outcomes {
            let _ = writeln!(out, "- {}", o.outcome);
        }
        out.push('\n');
    }

    if !c.skill_gaps.is_empty() {
        out.push_str("## Skill Gaps Addressed\n\n");
        for gap in &c.skill_gaps {
            let _ = writeln!(
                out,
                "### {}\n\n- **Gap:** {}\n- **Mitigation:** {}\n",
                gap.area, gap.gap_description, gap.mitigation_strategy
            );
        }
    }

    if !c.capstone_projects.is_empty() {
        out.push_str("## Capstone Projects\n\n");
        for project in &c.capstone_projects {
            let _ = writeln!(out, "### {}\n\n{}\n", project.title, project.description);
            if !project.tech_stack.is_empty() {
                let _ = writeln!(out, "- **Tech stack:** {}", project.tech_stack.join(", "));
            }
            if !project.deliverables.is_empty() {
                let _ = writeln!(out, "- **Deliverables:** {}", project.deliverables.join(", "));
            }
            out.push('\n');
        }
    }

    bullet_section(&mut out, "Job Roles", &c.job_roles);
    bullet_section(&mut out, "Skill Mapping", &c.skill_mapping);
    bullet_section(&mut out, "Assessment Methods", &c.assessment_methods);
    bullet_section(&mut out, "Tools & Technologies", &c.tools_and_tech);

    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "## {title}\n");
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_artifact;

    #[test]
    fn test_file_name_from_course_name() {
        let artifact = sample_artifact(2);
        assert_eq!(export_file_name(&artifact, "md"), "Data Science & ML.md");
        assert_eq!(export_file_name(&artifact, ".html"), "Data Science & ML.html");
    }

    #[test]
    fn test_file_name_sanitises_and_falls_back() {
        let mut artifact = sample_artifact(1);
        artifact.request.course_name = "AI/ML: <Intro>?".into();
        assert_eq!(export_file_name(&artifact, "md"), "AI ML Intro.md");

        artifact.request.course_name = " /// ".into();
        assert_eq!(export_file_name(&artifact, "md"), "Curriculum.md");

        artifact.request.course_name = "..".into();
        assert_eq!(export_file_name(&artifact, "pdf"), "Curriculum.pdf");
    }

    #[test]
    fn test_bloom_coverage_lists_every_level() {
        let artifact = sample_artifact(1);
        let coverage = bloom_coverage(&artifact.content);
        assert_eq!(coverage.len(), 6);
        let application = coverage
            .iter()
            .find(|c| c.level == BloomLevel::Application)
            .unwrap();
        assert_eq!(application.count, 2);
        assert_eq!(application.percent, 50);
        let synthesis = coverage
            .iter()
            .find(|c| c.level == BloomLevel::Synthesis)
            .unwrap();
        assert_eq!(synthesis.count, 0);
        assert_eq!(synthesis.percent, 0);
    }

    #[test]
    fn test_bloom_coverage_empty() {
        let mut artifact = sample_artifact(1);
        artifact.content.learning_outcomes.clear();
        assert!(bloom_coverage(&artifact.content)
            .iter()
            .all(|c| c.count == 0 && c.percent == 0));
    }

    #[test]
    fn test_markdown_contains_all_sections() {
        let artifact = sample_artifact(3);
        let md = render_markdown(&artifact);
        assert!(md.starts_with("# Data Science & ML\n"));
        for heading in [
            "## Intelligence Scores",
            "## Objectives",
            "## Weekly Syllabus",
            "### Week 3: Topic 3",
            "## Bloom's Taxonomy Coverage",
            "| Application | 2 | 50% |",
            "## Skill Gaps Addressed",
            "## Capstone Projects",
            "## Job Roles",
            "## Tools & Technologies",
        ] {
            assert!(md.contains(heading), "missing {heading}");
        }
        assert!(md.contains(&artifact.id.to_string()));
    }

    #[test]
    fn test_export_does_not_mutate() {
        let artifact = sample_artifact(2);
        let before = artifact.clone();
        let _ = render_markdown(&artifact);
        let _ = bloom_coverage(&artifact.content);
        assert_eq!(artifact, before);
    }
}
