//! Cadence CLI
//!
//! Command-line host for the adaptive learning scheduler. Learners and the
//! catalog live in the SQLite snapshot store; each command loads a learner,
//! runs one engine operation and saves the learner back.

mod workspace;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use cadence_core::{
    ContentItem, ContentType, InteractionEvent, InteractionType, LearnerSnapshot, Quality,
    RankOptions, RecommendationScore, ReviewEvent, SharedCatalog,
};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::workspace::Workspace;

/// Cadence - Adaptive Learning Scheduler CLI
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Cadence adaptive learning scheduler")]
#[command(long_about = "Cadence schedules reviews with SM-2, tracks each learner's zone of proximal development and recommends what to study next.")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database (defaults to the platform data directory)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a learner covering every catalog skill and queue the catalog
    Init {
        /// Learner id
        learner: String,
        /// Starting level for a skill, as skill=level (repeatable)
        #[arg(long = "level", value_parser = parse_level)]
        levels: Vec<(String, f64)>,
        /// Do not queue the catalog
        #[arg(long)]
        no_enqueue: bool,
    },

    /// Manage the content catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Queue a catalog item for a learner
    Enqueue {
        /// Learner id
        learner: String,
        /// Item id
        item: String,
    },

    /// Grade a review (quality 0-5)
    Grade {
        /// Learner id
        learner: String,
        /// Item id
        item: String,
        /// Quality of the answer, 0 (blackout) to 5 (perfect)
        quality: u8,
        /// Response time in seconds
        #[arg(long, default_value = "10.0")]
        latency: f64,
        /// Content type for items outside the catalog
        #[arg(long = "type")]
        content_type: Option<String>,
    },

    /// Record an interaction with a catalog item
    Interact {
        /// Learner id
        learner: String,
        /// Item id
        item: String,
        /// completed, started or skipped
        #[arg(long, default_value = "completed")]
        kind: String,
        /// Performance in [0, 1]
        #[arg(long, default_value = "0.0")]
        performance: f64,
        /// Minutes spent
        #[arg(long, default_value = "0.0")]
        minutes: f64,
        /// Explicit engagement in [0, 1]
        #[arg(long)]
        engagement: Option<f64>,
    },

    /// Show the highest-priority due reviews
    Due {
        /// Learner id
        learner: String,
        /// Maximum entries
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Fill up with items that are not due yet
        #[arg(long)]
        include_future: bool,
    },

    /// Rank catalog content for a learner
    Recommend {
        /// Learner id
        learner: String,
        /// Ranking strategy
        #[arg(long, value_enum, default_value = "all")]
        mode: RecommendMode,
        /// Maximum entries
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Only this content type
        #[arg(long = "type")]
        content_type: Option<String>,
        /// Drop items longer than this session (minutes)
        #[arg(long)]
        minutes: Option<f64>,
    },

    /// Plan a time-boxed study session
    Session {
        /// Learner id
        learner: String,
        /// Session length in minutes
        #[arg(long, default_value = "20")]
        minutes: f64,
        /// Only this content type
        #[arg(long = "type")]
        content_type: Option<String>,
    },

    /// Suggest a difficulty for a skill
    Difficulty {
        /// Learner id
        learner: String,
        /// Skill name
        skill: String,
    },

    /// Show learner statistics
    Stats {
        /// Learner id
        learner: String,
    },

    /// Export a learner snapshot as JSON
    Export {
        /// Learner id
        learner: String,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import a learner snapshot
    Import {
        /// Snapshot file
        file: PathBuf,
        /// Replace an existing learner with the same id
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Add or replace one item
    Add {
        /// Item id
        id: String,
        /// Content type
        #[arg(long = "type")]
        content_type: String,
        /// Difficulty in [0, 1]
        #[arg(long)]
        difficulty: f64,
        /// Skills practiced (comma-separated)
        #[arg(long)]
        skills: Option<String>,
        /// Prerequisite item ids (comma-separated)
        #[arg(long)]
        prerequisites: Option<String>,
        /// Estimated minutes
        #[arg(long, default_value = "5")]
        minutes: u32,
    },
    /// Import items from a JSON array
    Import {
        /// JSON file
        file: PathBuf,
    },
    /// List items
    List {
        /// Only this content type
        #[arg(long = "type")]
        content_type: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RecommendMode {
    /// Whole catalog
    All,
    /// Items practicing weak skills
    Weak,
    /// Items due for review
    Review,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let ws = Workspace::open(cli.config.as_deref(), cli.data_dir.as_deref())?;
    let json = cli.json;

    match cli.command {
        Commands::Init {
            learner,
            levels,
            no_enqueue,
        } => run_init(&ws, &learner, levels, !no_enqueue, json),
        Commands::Catalog { command } => run_catalog(&ws, command, json),
        Commands::Enqueue { learner, item } => run_enqueue(&ws, &learner, &item),
        Commands::Grade {
            learner,
            item,
            quality,
            latency,
            content_type,
        } => run_grade(&ws, &learner, &item, quality, latency, content_type, json),
        Commands::Interact {
            learner,
            item,
            kind,
            performance,
            minutes,
            engagement,
        } => run_interact(
            &ws,
            &learner,
            InteractionArgs {
                item,
                kind,
                performance,
                minutes,
                engagement,
            },
            json,
        ),
        Commands::Due {
            learner,
            limit,
            include_future,
        } => run_due(&ws, &learner, limit, include_future, json),
        Commands::Recommend {
            learner,
            mode,
            limit,
            content_type,
            minutes,
        } => run_recommend(&ws, &learner, mode, limit, content_type, minutes, json),
        Commands::Session {
            learner,
            minutes,
            content_type,
        } => run_session(&ws, &learner, minutes, content_type, json),
        Commands::Difficulty { learner, skill } => run_difficulty(&ws, &learner, &skill, json),
        Commands::Stats { learner } => run_stats(&ws, &learner, json),
        Commands::Export { learner, output } => run_export(&ws, &learner, output),
        Commands::Import { file, force } => run_import(&ws, file, force),
    }
}

// ============================================================================
// ARGUMENT PARSING
// ============================================================================

/// Parse `skill=level`
fn parse_level(raw: &str) -> Result<(String, f64), String> {
    let (skill, level) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected skill=level, got '{}'", raw))?;
    let skill = skill.trim();
    if skill.is_empty() {
        return Err("skill name must not be empty".to_string());
    }
    let level: f64 = level
        .trim()
        .parse()
        .map_err(|e| format!("invalid level '{}': {}", level, e))?;
    Ok((skill.to_string(), level))
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_content_type(raw: Option<String>) -> anyhow::Result<Option<ContentType>> {
    Ok(raw.map(|s| s.parse::<ContentType>()).transpose()?)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_init(
    ws: &Workspace,
    learner_id: &str,
    levels: Vec<(String, f64)>,
    enqueue: bool,
    json: bool,
) -> anyhow::Result<()> {
    if ws.store.load_learner(learner_id)?.is_some() {
        bail!("learner '{}' already exists", learner_id);
    }
    let catalog = ws.catalog()?;
    let levels: BTreeMap<String, f64> = levels.into_iter().collect();
    let now = Utc::now();

    let mut learner = ws.engine.new_learner(
        learner_id,
        &catalog,
        (!levels.is_empty()).then_some(&levels),
        now,
    )?;
    let queued = if enqueue {
        ws.engine.enqueue_catalog(&mut learner, &catalog, now)
    } else {
        0
    };
    ws.save(&learner)?;

    if json {
        return print_json(&ws.engine.stats(&learner, now));
    }
    println!(
        "{} learner {} ({} skills, {} items queued)",
        "Created".green().bold(),
        learner_id.white().bold(),
        learner.profile.skills.len(),
        queued
    );
    println!(
        "{}: {:.2}",
        "Optimal Difficulty".white().bold(),
        learner.profile.optimal_difficulty
    );
    Ok(())
}

fn run_catalog(ws: &Workspace, command: CatalogCommands, json: bool) -> anyhow::Result<()> {
    match command {
        CatalogCommands::Add {
            id,
            content_type,
            difficulty,
            skills,
            prerequisites,
            minutes,
        } => {
            let item = ContentItem::new(id, content_type.parse()?, difficulty)?
                .with_skills(split_list(skills))
                .with_prerequisites(split_list(prerequisites))
                .with_minutes(minutes);
            ws.store.upsert_item(&item)?;
            println!("{} {}", "Saved".green().bold(), item.id);
        }
        CatalogCommands::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let items: Vec<ContentItem> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of items", file.display()))?;
            let mut catalog = ws.catalog()?;
            for item in items {
                catalog.upsert(item)?;
            }
            let saved = ws.store.save_catalog(&catalog)?;
            println!("{} catalog ({} items)", "Imported".green().bold(), saved);
        }
        CatalogCommands::List { content_type } => {
            let catalog = ws.catalog()?;
            let filter = parse_content_type(content_type)?;
            let items: Vec<&ContentItem> = catalog
                .iter()
                .filter(|item| filter.is_none_or(|ct| item.content_type == ct))
                .collect();
            if json {
                return print_json(&items);
            }
            if items.is_empty() {
                println!("{}", "Catalog is empty.".dimmed());
            }
            for item in items {
                let skills: Vec<&str> = item.skills.iter().map(String::as_str).collect();
                println!(
                    "  {:20} {:10} difficulty {:.2}  {:>3} min  [{}]",
                    item.id.white().bold(),
                    item.content_type.to_string(),
                    item.difficulty,
                    item.estimated_minutes,
                    skills.join(", ").dimmed()
                );
            }
        }
    }
    Ok(())
}

fn run_enqueue(ws: &Workspace, learner_id: &str, item_id: &str) -> anyhow::Result<()> {
    let catalog = ws.catalog()?;
    let Some(item) = catalog.get(item_id) else {
        bail!("item '{}' is not in the catalog", item_id);
    };
    let mut learner = ws.learner(learner_id)?;
    if ws
        .engine
        .enqueue(&mut learner, item_id, item.content_type, Utc::now())
    {
        ws.save(&learner)?;
        println!("{} {}", "Queued".green().bold(), item_id);
    } else {
        println!("{} is already queued", item_id.yellow());
    }
    Ok(())
}

fn run_grade(
    ws: &Workspace,
    learner_id: &str,
    item_id: &str,
    quality: u8,
    latency: f64,
    content_type: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut learner = ws.learner(learner_id)?;
    let content_type = match parse_content_type(content_type)? {
        Some(ct) => ct,
        None => learner
            .queue
            .entry(item_id)
            .map(|entry| entry.content_type)
            .or_else(|| ws.catalog().ok()?.get(item_id).map(|item| item.content_type))
            .with_context(|| format!("unknown item '{}': pass --type", item_id))?,
    };

    let now = Utc::now();
    let event = ReviewEvent::new(item_id, Quality::new(quality)?, latency, content_type)?;
    let outcome = ws.engine.grade(&mut learner, &event, now)?;
    ws.save(&learner)?;
    ws.store.append_review(learner_id, &event, &outcome, now)?;

    if json {
        return print_json(&outcome);
    }
    let verdict = if outcome.was_correct {
        "correct".green().bold()
    } else {
        "incorrect".red().bold()
    };
    println!("{} {}: {}", "Graded".white().bold(), item_id, verdict);
    println!(
        "{}: {} day(s), due {}",
        "Next Interval".white().bold(),
        outcome.state.interval_days,
        outcome.next_due.format("%Y-%m-%d %H:%M")
    );
    println!("{}: {:.2}", "Ease".white().bold(), outcome.state.ease_factor);
    if outcome.graduated_now {
        println!("{}", "Item graduated to long-term review!".cyan().bold());
    }
    if outcome.daily_cap_exceeded {
        println!("{}", "Daily review cap exceeded.".yellow());
    }
    Ok(())
}

struct InteractionArgs {
    item: String,
    kind: String,
    performance: f64,
    minutes: f64,
    engagement: Option<f64>,
}

fn run_interact(
    ws: &Workspace,
    learner_id: &str,
    args: InteractionArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut learner = ws.learner(learner_id)?;
    let catalog = SharedCatalog::new(ws.catalog()?);
    let event = InteractionEvent {
        learner_id: learner_id.to_string(),
        content_id: args.item.clone(),
        interaction_type: args.kind.parse::<InteractionType>()?,
        performance: args.performance,
        time_spent_minutes: args.minutes,
        engagement: args.engagement,
        content_type: None,
        timestamp: Utc::now(),
    };
    let outcome = ws.engine.record_interaction(&mut learner, &catalog, event)?;
    ws.save(&learner)?;
    if let Some(item) = catalog.get(&args.item) {
        ws.store.upsert_item(&item)?;
    }

    if json {
        return print_json(&outcome);
    }
    println!("{} {} ({})", "Recorded".green().bold(), args.item, args.kind);
    for skill in &outcome.updated_skills {
        println!(
            "  {:20} level {:.2} ({:+.3})",
            skill.skill_name, skill.current_level, skill.trend
        );
    }
    if let Some(score) = outcome.engagement_score {
        println!("{}: {:.2}", "Engagement".white().bold(), score);
    }
    Ok(())
}

fn run_due(
    ws: &Workspace,
    learner_id: &str,
    limit: usize,
    include_future: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut learner = ws.learner(learner_id)?;
    let now = Utc::now();
    let due = ws.engine.poll_due(&mut learner, limit, include_future, now);
    ws.save(&learner)?;

    if json {
        return print_json(&due);
    }
    println!("{}", "=== Due Reviews ===".cyan().bold());
    if due.is_empty() {
        println!("{}", "Nothing to review.".dimmed());
    }
    for review in &due {
        let when = if review.scheduled_time <= now {
            "due".green()
        } else {
            review
                .scheduled_time
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed()
        };
        println!(
            "  {:20} {:9} {:10} priority {:.2}  {}",
            review.item_id.white().bold(),
            review.review_type.to_string(),
            review.content_type.to_string(),
            review.priority,
            when
        );
    }
    Ok(())
}

fn print_recommendations(title: &str, recs: &[RecommendationScore]) {
    println!("{}", format!("=== {} ===", title).cyan().bold());
    if recs.is_empty() {
        println!("{}", "No recommendations.".dimmed());
    }
    for (rank, rec) in recs.iter().enumerate() {
        println!(
            "{:>3}. {:20} {:10} score {:.3}  priority {:.3}  {:>3} min",
            rank + 1,
            rec.content_id.white().bold(),
            rec.content_type.to_string(),
            rec.total_score,
            rec.priority,
            rec.estimated_minutes
        );
        for reason in &rec.reasons {
            println!("       {} {}", ">".cyan(), reason.dimmed());
        }
    }
}

fn run_recommend(
    ws: &Workspace,
    learner_id: &str,
    mode: RecommendMode,
    limit: usize,
    content_type: Option<String>,
    minutes: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    let learner = ws.learner(learner_id)?;
    let catalog = ws.catalog()?;
    let options = RankOptions {
        session_minutes: minutes,
        content_type: parse_content_type(content_type)?,
        limit: Some(limit),
    };
    let now = Utc::now();
    let (title, recs) = match mode {
        RecommendMode::All => (
            "Recommendations",
            ws.engine.recommend(&learner, &catalog, &options, now)?,
        ),
        RecommendMode::Weak => (
            "Weak Skill Practice",
            ws.engine
                .recommend_for_weaknesses(&learner, &catalog, &options, now)?,
        ),
        RecommendMode::Review => (
            "Reviews",
            ws.engine
                .recommend_reviews(&learner, &catalog, &options, now)?,
        ),
    };

    if json {
        return print_json(&recs);
    }
    print_recommendations(title, &recs);
    Ok(())
}

fn run_session(
    ws: &Workspace,
    learner_id: &str,
    minutes: f64,
    content_type: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let learner = ws.learner(learner_id)?;
    let catalog = ws.catalog()?;
    let plan = ws.engine.select_session(
        &learner,
        &catalog,
        minutes,
        parse_content_type(content_type)?,
        Utc::now(),
    )?;

    if json {
        return print_json(&plan);
    }
    print_recommendations("Session Plan", &plan.items);
    println!();
    println!(
        "{}: {} of {:.0} minutes",
        "Planned".white().bold(),
        plan.total_minutes,
        plan.budget_minutes
    );
    Ok(())
}

fn run_difficulty(ws: &Workspace, learner_id: &str, skill: &str, json: bool) -> anyhow::Result<()> {
    let learner = ws.learner(learner_id)?;
    let rec = ws.engine.recommend_difficulty(&learner, skill);
    if json {
        return print_json(&rec);
    }
    println!("{}: {}", "Skill".white().bold(), rec.skill);
    println!("{}: {:.2}", "Current Level".white().bold(), rec.skill_level);
    println!("{}: {:.2}", "Suggested Difficulty".white().bold(), rec.difficulty);
    println!("{}: {}", "Zone".white().bold(), rec.zone);
    println!(
        "{}: [{:.2}, {:.2}]",
        "ZPD".white().bold(),
        rec.zpd_range.lower,
        rec.zpd_range.upper
    );
    Ok(())
}

fn run_stats(ws: &Workspace, learner_id: &str, json: bool) -> anyhow::Result<()> {
    let learner = ws.learner(learner_id)?;
    let stats = ws.engine.stats(&learner, Utc::now());
    if json {
        return print_json(&stats);
    }

    let q = &stats.queue;
    let p = &stats.performance;
    println!("{}", format!("=== {} ===", stats.learner_id).cyan().bold());
    println!();
    println!("{}: {}", "Items".white().bold(), q.total_items);
    println!(
        "{}: {} new, {} learning, {} review, {} overdue",
        "Queue".white().bold(),
        q.new_items,
        q.learning,
        q.review,
        q.overdue
    );
    println!("{}: {}", "Due Now".white().bold(), q.due_now);
    println!("{}: {}", "Graduated".white().bold(), q.graduated);
    println!(
        "{}: {}/{}{}",
        "Today".white().bold(),
        q.completed_today,
        q.max_daily_reviews,
        if q.cap_reached { " (cap reached)".yellow().to_string() } else { String::new() }
    );
    println!("{}: {:.1}%", "Average Retention".white().bold(), q.average_retention * 100.0);
    println!("{}: {:.2}", "Performance Factor".white().bold(), q.global_performance_factor);

    println!();
    println!("{}", "=== Performance ===".yellow().bold());
    println!("{}: {}", "Total Reviews".white().bold(), p.total_reviews);
    println!("{}: {:.1}%", "Accuracy".white().bold(), p.accuracy * 100.0);
    println!("{}: {:.1}%", "Recent Accuracy".white().bold(), p.recent_accuracy * 100.0);
    println!("{}: {:.2}", "Consistency".white().bold(), p.consistency);
    println!("{}: {:.2}", "Learning Velocity".white().bold(), p.learning_velocity);
    println!(
        "{}: {:.0} min",
        "Optimal Session".white().bold(),
        p.optimal_session_minutes
    );
    for (content_type, mastery) in &p.content_type_mastery {
        println!("  {:12} mastery {:.2}", content_type.to_string(), mastery);
    }

    println!();
    println!("{}", "=== Skills ===".magenta().bold());
    println!(
        "{}: {:.2} in [{:.2}, {:.2}]",
        "Optimal Difficulty".white().bold(),
        stats.optimal_difficulty,
        stats.zpd_range.lower,
        stats.zpd_range.upper
    );
    println!("{}: {}", "Weakest".white().bold(), stats.weak_skills.join(", "));
    println!("{}: {}", "Strongest".white().bold(), stats.strong_skills.join(", "));

    if !p.recommendations.is_empty() {
        println!();
        println!("{}", "Recommendations:".cyan().bold());
        for rec in &p.recommendations {
            println!("  {} {}", ">".cyan(), rec);
        }
    }
    Ok(())
}

fn run_export(ws: &Workspace, learner_id: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let learner = ws.learner(learner_id)?;
    let json = ws.engine.export(&learner, Utc::now()).to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "Exported to".green().bold(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

fn run_import(ws: &Workspace, file: PathBuf, force: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let snapshot = LearnerSnapshot::from_json(&raw)?;
    if !force && ws.store.load_learner(&snapshot.learner_id)?.is_some() {
        bail!(
            "learner '{}' already exists (use --force to replace)",
            snapshot.learner_id
        );
    }
    let learner = ws.engine.import(snapshot)?;
    ws.save(&learner)?;
    println!(
        "{} learner {} ({} items)",
        "Imported".green().bold(),
        learner.learner_id.white().bold(),
        learner.queue.len()
    );
    Ok(())
}
