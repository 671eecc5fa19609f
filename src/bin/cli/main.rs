use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use lexis_lib::catalog::{StaticCatalog, WordMeta};
use lexis_lib::clock::SystemClock;
use lexis_lib::config::EngineConfig;
use lexis_lib::progress::{ActionSummary, ProgressStore, ProgressTracker};
use lexis_lib::sync::SyncOutbox;

#[derive(Parser)]
#[command(name = "lexis-cli", about = "Lexis progress engine CLI", version)]
struct Cli {
    /// Learner id
    #[arg(long, global = true, default_value = "local")]
    user: String,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a word view
    View { word: String },

    /// Record a recall outcome
    Recall {
        word: String,
        /// Record a failed recall instead of a success
        #[arg(long)]
        fail: bool,
    },

    /// Record an active production success
    Practice { word: String },

    /// Mark a word as mastered
    Master { word: String },

    /// Record a completed study session
    Session {
        /// Session length in minutes
        #[arg(long, default_value = "5")]
        minutes: u64,
    },

    /// Set the daily XP goal
    Goal { xp: i64 },

    /// Show the learner dashboard
    Dashboard,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => ProgressStore::default_data_dir().context("no data directory available")?,
    };

    // Optional per-deployment overrides next to the data
    let config_path = data_dir.join("engine.toml");
    let config = if config_path.exists() {
        EngineConfig::load(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    } else {
        EngineConfig::default()
    };

    // Words the bundled catalog doesn't know get middling metadata so local
    // experiments always record.
    let catalog_path = data_dir.join("catalog.json");
    let mut catalog = if catalog_path.exists() {
        StaticCatalog::load(&catalog_path)
            .with_context(|| format!("failed to load {}", catalog_path.display()))?
    } else {
        StaticCatalog::new()
    };
    catalog.set_fallback(WordMeta { rank: 1000, frequency: 50 });

    let tracker = ProgressTracker::new(
        ProgressStore::new(data_dir.clone()),
        Box::new(catalog),
        Box::new(SystemClock),
        config,
    )
    .with_outbox(SyncOutbox::new(data_dir.join("sync_queue.jsonl")));

    match cli.command {
        Command::View { word } => {
            let summary = tracker.record_word_view(&cli.user, &word)?;
            print_summary(&summary);
        }
        Command::Recall { word, fail } => {
            if fail {
                let summary = tracker.record_recall_fail(&cli.user, &word)?;
                println!("Recorded failed recall of '{}'", word);
                print_summary(&summary);
            } else {
                match tracker.record_recall_success(&cli.user, &word)? {
                    Some(summary) => print_summary(&summary),
                    None => println!("'{}' is not in the catalog; nothing recorded", word),
                }
            }
        }
        Command::Practice { word } => match tracker.record_production_success(&cli.user, &word)? {
            Some(summary) => print_summary(&summary),
            None => println!("'{}' is not in the catalog; nothing recorded", word),
        },
        Command::Master { word } => {
            let summary = tracker.record_word_mastered(&cli.user, &word)?;
            print_summary(&summary);
        }
        Command::Session { minutes } => {
            tracker.record_session(&cli.user, minutes * 60 * 1000)?;
            println!("Recorded a {} minute session", minutes);
        }
        Command::Goal { xp } => {
            tracker.set_daily_goal(&cli.user, xp)?;
            println!("Daily goal set to {} XP (applies from tomorrow)", xp);
        }
        Command::Dashboard => {
            let d = tracker.get_dashboard(&cli.user)?;
            println!(
                "Level {}  ({} XP, {:.0}% to next)",
                d.level,
                d.total_xp,
                d.level_progress * 100.0
            );
            println!(
                "Streak {} days (best {}, {} freezes left)",
                d.current_streak, d.best_streak, d.streak_freezes
            );
            println!(
                "Today: {} XP / goal {}{}",
                d.daily_goal_progress,
                d.daily_goal_target,
                if d.daily_goal_met { "  ✓ met" } else { "" }
            );
            println!(
                "Words: {} viewed, {} learning, {} known, {} mastered, {} due",
                d.words_viewed,
                d.words_learning,
                d.words_learned,
                d.words_mastered,
                d.words_needing_review
            );
            println!(
                "{} days active, {} sessions, {} min studied",
                d.days_active,
                d.session_count,
                d.total_time_ms / 60_000
            );
        }
    }

    Ok(())
}

fn print_summary(summary: &ActionSummary) {
    if summary.total_xp_awarded > 0 {
        println!(
            "+{} XP (base {} × {:.2})  lifetime {}",
            summary.total_xp_awarded,
            summary.base_xp,
            summary.streak_multiplier,
            summary.new_lifetime_xp
        );
    }
    if summary.leveled_up {
        println!("Level up! Now level {}", summary.new_level);
    }
    if summary.daily_goal_just_met {
        println!("Daily goal met!");
    }
}
