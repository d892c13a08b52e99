use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use syllabi_core::advisory::{self, Severity};
use syllabi_core::config::SyllabiConfig;
use syllabi_core::export;
use syllabi_core::generation::{create_generator, CurriculumGenerator, Generator, OfflineGenerator};
use syllabi_core::model::*;
use syllabi_core::storage::{create_backend, Storage};
use syllabi_core::Workbench;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "syllabi", about = "Syllabi: generate and refine course curricula", version)]
enum Cli {
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in to an existing account
    Login {
        #[arg(long)]
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out of this profile
    Logout,
    /// Show the signed-in account
    Whoami {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a new curriculum
    Generate {
        /// Course name, e.g. "Data Science & ML"
        course_name: String,
        /// Industry mode (startup, corporate, research)
        #[arg(short, long, default_value = "corporate")]
        mode: String,
        /// Duration in weeks
        #[arg(short, long, default_value = "12")]
        weeks: u32,
        /// Credit hours
        #[arg(short, long, default_value = "4")]
        credits: u32,
        /// Subject area (see `syllabi catalog`)
        #[arg(long)]
        subject: Option<String>,
        /// Academic level (see `syllabi catalog`)
        #[arg(long)]
        level: Option<String>,
        /// Industry focus (see `syllabi catalog`)
        #[arg(long)]
        focus: Option<String>,
        /// Teaching type (see `syllabi catalog`)
        #[arg(long)]
        teaching: Option<String>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Regenerate a curriculum from feedback, keeping its identity
    Refine {
        /// What to change, e.g. "add more labs"
        feedback: String,
        /// Curriculum ID or prefix (default: most recent)
        #[arg(long)]
        id: Option<String>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a curriculum
    EditTitle {
        /// New course name
        title: String,
        /// Curriculum ID or prefix (default: most recent)
        #[arg(long)]
        id: Option<String>,
    },
    /// Edit one week of the syllabus
    EditModule {
        /// Week position in the syllabus, starting at 1
        week: usize,
        /// New topic
        #[arg(long)]
        topic: Option<String>,
        /// New description
        #[arg(long)]
        content: Option<String>,
        /// Curriculum ID or prefix (default: most recent)
        #[arg(long)]
        id: Option<String>,
    },
    /// List saved curricula, most recent first
    History {
        /// Output raw JSON instead of table
        #[arg(long)]
        json: bool,
    },
    /// Show a curriculum in full
    Show {
        /// Curriculum ID or prefix (default: most recent)
        id: Option<String>,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a curriculum from history
    Delete {
        /// Curriculum ID or prefix
        id: String,
        /// Required: deletion cannot be undone
        #[arg(long)]
        confirm: bool,
        /// Output raw JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Export a curriculum as Markdown
    Export {
        /// Curriculum ID or prefix (default: most recent)
        id: Option<String>,
        /// Output format (md)
        #[arg(short, long, default_value = "md")]
        format: String,
        /// Output file path (default: named after the course)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check the credit-to-duration balance of a course
    Advise {
        #[arg(short, long)]
        weeks: u32,
        #[arg(short, long)]
        credits: u32,
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// List the suggested values for the curriculum form
    Catalog {
        /// Output raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Show configuration, storage, and session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".parse().unwrap()),
        )
        .compact()
        .init();

    let cli = Cli::parse();
    let config = SyllabiConfig::load(Some(&std::env::current_dir()?)).unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e}");
        SyllabiConfig::default_config()
    });

    run(cli, &config).await
}

async fn run(cli: Cli, config: &SyllabiConfig) -> Result<()> {
    match cli {
        // These never touch the profile
        Cli::Advise {
            weeks,
            credits,
            json,
        } => cmd_advise(weeks, credits, json),
        Cli::Catalog { json } => cmd_catalog(json),
        other => {
            let wb = open_workbench(config).await?;
            run_with_profile(other, &wb, config).await
        }
    }
}

async fn run_with_profile(
    cli: Cli,
    wb: &Workbench<Generator, Storage>,
    config: &SyllabiConfig,
) -> Result<()> {
    match cli {
        Cli::Register {
            name,
            email,
            password,
        } => {
            let password = read_password(password)?;
            let session = wb.register(&name, &email, &password).await?;
            println!(
                "{} {} <{}>",
                "Registered and signed in:".green(),
                session.user.name,
                session.email().cyan()
            );
            Ok(())
        }
        Cli::Login { email, password } => {
            let password = read_password(password)?;
            let session = wb.login(&email, &password).await?;
            let saved = wb.history()?.len();
            println!(
                "{} {} <{}> ({} saved curricul{})",
                "Signed in:".green(),
                session.user.name,
                session.email().cyan(),
                saved,
                if saved == 1 { "um" } else { "a" }
            );
            Ok(())
        }
        Cli::Logout => {
            wb.logout().await?;
            println!("{}", "Signed out.".green());
            Ok(())
        }
        Cli::Whoami { json } => cmd_whoami(wb, json),
        Cli::Generate {
            course_name,
            mode,
            weeks,
            credits,
            subject,
            level,
            focus,
            teaching,
            json,
        } => {
            let mode: IndustryMode = mode.parse().map_err(anyhow::Error::msg)?;
            let mut request = CurriculumRequest::new(course_name, mode)
                .with_duration(weeks)
                .with_credits(credits);
            if let Some(v) = subject {
                request = request.with_subject_area(v);
            }
            if let Some(v) = level {
                request = request.with_academic_level(v);
            }
            if let Some(v) = focus {
                request = request.with_industry_focus(v);
            }
            if let Some(v) = teaching {
                request = request.with_teaching_type(v);
            }
            cmd_generate(wb, request, json).await
        }
        Cli::Refine { feedback, id, json } => cmd_refine(wb, id.as_deref(), &feedback, json).await,
        Cli::EditTitle { title, id } => {
            let edit = FieldEdit::CourseName { value: title };
            cmd_edit(wb, id.as_deref(), &[edit]).await
        }
        Cli::EditModule {
            week,
            topic,
            content,
            id,
        } => {
            if week == 0 {
                anyhow::bail!("week positions start at 1");
            }
            let index = week - 1;
            let mut edits = Vec::new();
            if let Some(value) = topic {
                edits.push(FieldEdit::ModuleTopic { index, value });
            }
            if let Some(value) = content {
                edits.push(FieldEdit::ModuleContent { index, value });
            }
            if edits.is_empty() {
                anyhow::bail!("nothing to change: pass --topic and/or --content");
            }
            cmd_edit(wb, id.as_deref(), &edits).await
        }
        Cli::History { json } => cmd_history(wb, json),
        Cli::Show { id, json } => cmd_show(wb, id.as_deref(), json),
        Cli::Delete { id, confirm, json } => cmd_delete(wb, &id, confirm, json).await,
        Cli::Export { id, format, output } => cmd_export(wb, id.as_deref(), &format, output),
        Cli::Status => cmd_status(wb, config),
        Cli::Advise {
            weeks,
            credits,
            json,
        } => cmd_advise(weeks, credits, json),
        Cli::Catalog { json } => cmd_catalog(json),
    }
}

// ---------------------------------------------------------------------------
// setup helpers
// ---------------------------------------------------------------------------

async fn open_workbench(config: &SyllabiConfig) -> Result<Workbench<Generator, Storage>> {
    let backend = create_backend(config).context("failed to open storage")?;
    let generator = create_generator(&config.llm).unwrap_or_else(|e| {
        tracing::warn!("{e}; falling back to the offline generator");
        Generator::Offline(OfflineGenerator)
    });
    let wb = Workbench::new(backend, generator, config.history.max_entries);
    wb.restore().await.context("failed to restore session")?;
    Ok(wb)
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(p) = given {
        return Ok(p);
    }
    eprint!("Password: ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Resolve a full id or unique prefix against the saved curricula.
fn resolve_id(history: &[CurriculumArtifact], id: &str) -> Result<Uuid> {
    if let Ok(full) = Uuid::parse_str(id) {
        return Ok(full);
    }
    let matches: Vec<_> = history
        .iter()
        .filter(|a| a.id.to_string().starts_with(id))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("no curriculum found matching prefix '{id}'"),
        1 => Ok(matches[0].id),
        n => anyhow::bail!("ambiguous prefix '{id}' matches {n} curricula. Use a longer prefix."),
    }
}

/// Make the chosen (or most recent) saved curriculum current and return it.
async fn activate(wb: &Workbench<Generator, Storage>, id: Option<&str>) -> Result<CurriculumArtifact> {
    let history = wb.history()?;
    let target = match id {
        Some(id) => resolve_id(&history, id)?,
        None => {
            history
                .first()
                .context("no saved curricula. Run `syllabi generate` first.")?
                .id
        }
    };
    Ok(wb.select(target).await?)
}

fn lookup(wb: &Workbench<Generator, Storage>, id: Option<&str>) -> Result<CurriculumArtifact> {
    let history = wb.history()?;
    match id {
        Some(id) => Ok(wb.history_entry(resolve_id(&history, id)?)?),
        None => history
            .into_iter()
            .next()
            .context("no saved curricula. Run `syllabi generate` first."),
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

// ---------------------------------------------------------------------------
// commands
// ---------------------------------------------------------------------------

fn cmd_whoami(wb: &Workbench<Generator, Storage>, json: bool) -> Result<()> {
    let session = wb.session();
    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }
    match session {
        Some(s) => println!(
            "{} <{}> {}",
            s.user.name,
            s.email().cyan(),
            format!("since {}", s.started_at.format("%Y-%m-%d %H:%M")).dimmed()
        ),
        None => println!("{}", "Not signed in.".yellow()),
    }
    Ok(())
}

async fn cmd_generate(
    wb: &Workbench<Generator, Storage>,
    request: CurriculumRequest,
    json: bool,
) -> Result<()> {
    if !json {
        eprintln!(
            "{} {} with {}...",
            "Generating".cyan(),
            request.course_name,
            wb.generator().describe()
        );
        print_advisory(request.duration_weeks, request.credit_hours);
    }
    let artifact = wb.create(request).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_summary(&artifact);
    }
    Ok(())
}

async fn cmd_refine(
    wb: &Workbench<Generator, Storage>,
    id: Option<&str>,
    feedback: &str,
    json: bool,
) -> Result<()> {
    let target = activate(wb, id).await?;
    if !json {
        eprintln!(
            "{} {} ({})...",
            "Refining".cyan(),
            target.course_name(),
            short_id(target.id)
        );
    }
    let artifact = wb.regenerate(feedback).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print_summary(&artifact);
    }
    Ok(())
}

async fn cmd_edit(
    wb: &Workbench<Generator, Storage>,
    id: Option<&str>,
    edits: &[FieldEdit],
) -> Result<()> {
    activate(wb, id).await?;
    let mut artifact = None;
    for edit in edits {
        artifact = Some(wb.edit_field(edit).await?);
    }
    if let Some(a) = artifact {
        println!(
            "{} {} ({})",
            "Updated:".green(),
            a.course_name(),
            short_id(a.id).cyan()
        );
    }
    Ok(())
}

fn cmd_history(wb: &Workbench<Generator, Storage>, json: bool) -> Result<()> {
    let history = wb.history()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No saved curricula.");
        return Ok(());
    }

    println!(
        "  {}  {}  {}  {}  {}",
        format!("{:<8}", "ID").dimmed(),
        format!("{:<16}", "Updated").dimmed(),
        format!("{:<10}", "Mode").dimmed(),
        format!("{:<12}", "Structure").dimmed(),
        "Course".dimmed(),
    );
    println!("{}", "─".repeat(78).dimmed());

    for a in &history {
        let structure = format!("{}w / {}cr", a.request.duration_weeks, a.request.credit_hours);
        println!(
            "  {}  {}  {:<10}  {:<12}  {}",
            short_id(a.id).cyan(),
            a.timestamp.format("%Y-%m-%d %H:%M"),
            a.request.mode.to_string().magenta(),
            structure.dimmed(),
            a.course_name(),
        );
    }

    println!("{}", "─".repeat(78).dimmed());
    println!(
        "  {} curricul{}",
        history.len(),
        if history.len() == 1 { "um" } else { "a" }
    );
    Ok(())
}

fn cmd_show(wb: &Workbench<Generator, Storage>, id: Option<&str>, json: bool) -> Result<()> {
    let artifact = lookup(wb, id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
        return Ok(());
    }

    let r = &artifact.request;
    let c = &artifact.content;
    println!("{}", r.course_name.bold());
    println!(
        "{} {} {}",
        r.mode.to_string().magenta(),
        format!("{} weeks · {} credits", r.duration_weeks, r.credit_hours).dimmed(),
        format!("{} · {} · {}", r.subject_area, r.academic_level, r.teaching_type).dimmed()
    );
    print_advisory(r.duration_weeks, r.credit_hours);
    println!();
    println!("{}", c.description);

    println!();
    println!("{}", "--- Objectives ---".dimmed());
    for o in &c.objectives {
        println!("  • {o}");
    }

    println!();
    println!("{}", "--- Weekly Syllabus ---".dimmed());
    for m in &c.modules {
        println!("  {} {}", format!("Week {:>2}", m.week).cyan(), m.topic.bold());
        println!("          {}", m.content);
    }

    println!();
    println!("{}", "--- Bloom's Coverage ---".dimmed());
    for b in export::bloom_coverage(c) {
        println!(
            "  {:<14} {:<20} {}",
            b.level.to_string(),
            "█".repeat(usize::from(b.percent) / 5).green(),
            b.count
        );
    }

    println!();
    println!("{}", "--- Intelligence Scores ---".dimmed());
    for (label, score) in c.intelligence_scores.labelled() {
        println!("  {label:<20} {score:>3}");
    }

    if !c.job_roles.is_empty() {
        println!();
        println!("{}  {}", "Job roles:".dimmed(), c.job_roles.join(", "));
    }
    for p in &c.capstone_projects {
        println!("{}  {}", "Capstone:".dimmed(), p.title);
    }

    println!();
    println!("{}", "--- Details ---".dimmed());
    println!("  {}  {}", "ID:".dimmed(), artifact.id.to_string().cyan());
    println!(
        "  {}  {}",
        "Updated:".dimmed(),
        artifact.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

async fn cmd_delete(
    wb: &Workbench<Generator, Storage>,
    id: &str,
    confirm: bool,
    json: bool,
) -> Result<()> {
    if !confirm {
        anyhow::bail!("delete requires --confirm flag. Deleted curricula cannot be recovered.");
    }
    let target = wb.history_entry(resolve_id(&wb.history()?, id)?)?;
    let remaining = wb.delete(target.id).await.context("failed to delete curriculum")?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "deleted": target.id.to_string(),
                "course_name": target.course_name(),
                "remaining": remaining.len(),
            })
        );
    } else {
        println!(
            "{} {} ({})",
            "Deleted:".red(),
            target.course_name(),
            short_id(target.id).cyan()
        );
    }
    Ok(())
}

fn cmd_export(
    wb: &Workbench<Generator, Storage>,
    id: Option<&str>,
    format: &str,
    output: Option<PathBuf>,
) -> Result<()> {
    let artifact = lookup(wb, id)?;
    let (ext, body) = match format {
        "md" | "markdown" => ("md", export::render_markdown(&artifact)),
        other => anyhow::bail!(
            "unknown export format: {other} (expected md; print from the web view at /curriculum/print)"
        ),
    };
    let path = output.unwrap_or_else(|| PathBuf::from(export::export_file_name(&artifact, ext)));
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} {}", "Exported:".green(), path.display().to_string().cyan());
    Ok(())
}

fn cmd_advise(weeks: u32, credits: u32, json: bool) -> Result<()> {
    if weeks == 0 || credits == 0 {
        anyhow::bail!("weeks and credits must be positive");
    }
    let advice = advisory::credit_advisory(weeks, credits);
    if json {
        println!("{}", serde_json::json!({ "advisory": advice }));
        return Ok(());
    }
    if advice.is_none() {
        println!(
            "{} {credits} credits over {weeks} weeks is a balanced load.",
            "OK:".green()
        );
    }
    print_advisory(weeks, credits);
    Ok(())
}

fn cmd_catalog(json: bool) -> Result<()> {
    let modes: Vec<_> = IndustryMode::ALL
        .iter()
        .map(|m| serde_json::json!({ "mode": m, "description": m.description() }))
        .collect();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "course_titles": catalog::COURSE_TITLES,
                "subject_areas": catalog::SUBJECT_AREAS,
                "academic_levels": catalog::ACADEMIC_LEVELS,
                "teaching_types": catalog::TEACHING_TYPES,
                "industry_focus": catalog::INDUSTRY_FOCUS_OPTIONS,
                "modes": modes,
            }))?
        );
        return Ok(());
    }

    let sections: [(&str, &[&str]); 5] = [
        ("Course titles", catalog::COURSE_TITLES),
        ("Subject areas", catalog::SUBJECT_AREAS),
        ("Academic levels", catalog::ACADEMIC_LEVELS),
        ("Teaching types", catalog::TEACHING_TYPES),
        ("Industry focus", catalog::INDUSTRY_FOCUS_OPTIONS),
    ];
    for (title, values) in sections {
        println!("{}", title.bold());
        for v in values {
            println!("  {v}");
        }
        println!();
    }
    println!("{}", "Modes".bold());
    for m in IndustryMode::ALL {
        println!("  {:<10} {}", m.to_string().magenta(), m.description().dimmed());
    }
    Ok(())
}

fn cmd_status(wb: &Workbench<Generator, Storage>, config: &SyllabiConfig) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    println!("{}", format!("Syllabi Status v{version}").bold());
    println!("  {}  {}", "Generator:".dimmed(), wb.generator().describe());
    println!("  {}    {}", "Storage:".dimmed(), config.storage.backend);
    println!(
        "  {}    {} entries",
        "History:".dimmed(),
        config.history.max_entries
    );
    match wb.session() {
        Some(s) => {
            println!("  {}    {}", "Account:".dimmed(), s.email().cyan());
            println!("  {}      {}", "Saved:".dimmed(), wb.history()?.len());
        }
        None => println!("  {}    {}", "Account:".dimmed(), "not signed in".yellow()),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// output helpers
// ---------------------------------------------------------------------------

fn print_summary(artifact: &CurriculumArtifact) {
    println!(
        "{} {} ({})",
        "Saved:".green(),
        artifact.course_name().bold(),
        short_id(artifact.id).cyan()
    );
    println!(
        "  {} weeks · {} credits · {} modules · {} outcomes",
        artifact.request.duration_weeks,
        artifact.request.credit_hours,
        artifact.content.modules.len(),
        artifact.content.learning_outcomes.len()
    );
}

fn print_advisory(weeks: u32, credits: u32) {
    if let Some(a) = advisory::credit_advisory(weeks, credits) {
        match a.severity {
            Severity::Warning => eprintln!("{} {}", "!".yellow(), a.message.yellow()),
            Severity::Info => eprintln!("{} {}", "i".blue(), a.message.dimmed()),
        }
    }
}
