use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use exercia::{
    calendar::{self, MuscleGroupScores, ScoreBand, DEFAULT_MAX_SCORE, DEFAULT_TARGET_REPS},
    client::{ApiClient, CommandNarrator, DirectoryFrameSource, HttpPoseAnalyzer, LogNarrator, Narrator},
    config::TrainerConfig,
    models::{Exercise, WorkoutEntry},
    trainer::{Control, SessionSettings, TrainingSession},
};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    name = "exercia-trainer",
    about = "Camera-driven workout trainer",
    long_about = "Runs pose-analysis training sessions against recorded frames and shows workout history from the Exercia API."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a training session
    Train {
        /// pushup, plank or twist
        exercise: Exercise,

        /// Directory of JPEG frames replayed as the camera
        #[arg(long)]
        frames: PathBuf,

        /// Log the finished workout for this account
        #[arg(long)]
        email: Option<String>,

        /// End the session automatically after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Show a month of workouts as a calendar
    Calendar {
        #[arg(long)]
        email: String,

        /// Month as YYYY-MM
        #[arg(long)]
        month: String,

        /// Reps per day that count as a full day
        #[arg(long, default_value = "100")]
        goal: i64,
    },

    /// Show session counts, rep totals and muscle-group progress
    Summary {
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(level));

    let config = TrainerConfig::from_env();

    let result = match cli.command {
        Command::Train {
            exercise,
            frames,
            email,
            duration_secs,
        } => train(&config, exercise, frames, email, duration_secs.map(Duration::from_secs)).await,
        Command::Calendar { email, month, goal } => show_calendar(&config, &email, &month, goal).await,
        Command::Summary { email } => show_summary(&config, &email).await,
    };

    if let Err(e) = result {
        log::error!("❌ {}", e);
        std::process::exit(1);
    }
}

fn build_narrator(config: &TrainerConfig) -> Result<Arc<dyn Narrator>> {
    match &config.tts_command {
        Some(command) => Ok(Arc::new(CommandNarrator::from_command_line(command)?)),
        None => Ok(Arc::new(LogNarrator)),
    }
}

async fn train(
    config: &TrainerConfig,
    exercise: Exercise,
    frames: PathBuf,
    email: Option<String>,
    limit: Option<Duration>,
) -> Result<()> {
    let frames = DirectoryFrameSource::open(&frames)?;
    let analyzer = HttpPoseAnalyzer::new(config.pose_service_url.clone(), config.request_timeout);
    let narrator = build_narrator(config)?;

    let session = TrainingSession::new(exercise, analyzer, frames, narrator, SessionSettings::from(config));
    let mut updates = session.subscribe();

    let (controls, rx) = mpsc::channel(8);
    read_controls(controls.clone());
    tokio::spawn(end_on_signal(controls, limit));

    let printer = tokio::spawn(async move {
        let mut last_line = String::new();
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let line = if exercise.is_timed() {
                format!("⏱️  {:.1}s | {}", snapshot.hold_seconds, snapshot.feedback)
            } else {
                format!("🔢 {} reps | {}", snapshot.rep_count, snapshot.feedback)
            };
            if line != last_line {
                println!("{}", line);
                last_line = line;
            }
        }
    });

    println!("Training {} - [Enter] pause/resume, [q] finish, Ctrl-C to stop", exercise);
    let report = session.run(rx).await;
    let _ = printer.await;

    println!();
    println!("Session {}", report.session_id);
    println!("  exercise:  {}", report.exercise);
    if report.exercise.is_timed() {
        println!("  hold time: {:.1}s", report.time_taken);
    } else {
        println!("  reps:      {}", report.reps);
        println!("  time:      {:.1}s", report.time_taken);
    }
    println!(
        "  frames:    {} analyzed, {} failed, {} ticks skipped",
        report.frames_sent, report.frames_failed, report.skipped_ticks
    );
    println!("  {}", report.final_feedback);

    if let Some(email) = email {
        let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout);
        let logged = api.log_workout(&report.to_workout(&email, Utc::now())).await?;
        println!("✅ {}", logged.message);
    }

    Ok(())
}

/// Keyboard controls: Enter toggles, `p`/`r` pause and resume, `q` ends.
/// Reads on a dedicated thread.
fn read_controls(controls: mpsc::Sender<Control>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("⚠️  Cannot read controls from stdin: {}", e);
                    return;
                }
            };

            let control = match line.trim() {
                "" => Control::Toggle,
                "p" => Control::Pause,
                "r" => Control::Resume,
                "q" => Control::End,
                other => {
                    log::debug!("Ignoring input '{}'", other);
                    continue;
                }
            };

            if controls.blocking_send(control).is_err() || control == Control::End {
                return;
            }
        }
    });
}

async fn end_on_signal(controls: mpsc::Sender<Control>, limit: Option<Duration>) {
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("⚠️  Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let deadline = async {
        match limit {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = interrupted => log::info!("🛑 Interrupted, finishing session"),
        _ = deadline => log::info!("⏱️  Time limit reached, finishing session"),
    }

    let _ = controls.send(Control::End).await;
}

/// Fetches the full history once; invalid entries are skipped.
async fn fetch_entries(api: &ApiClient, email: &str) -> Result<Vec<WorkoutEntry>> {
    let history = api.history(email, None, None).await?;

    Ok(history
        .iter()
        .filter_map(|item| match item.to_entry() {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("⚠️  Skipping workout: {}", e);
                None
            }
        })
        .collect())
}

async fn show_calendar(config: &TrainerConfig, email: &str, month: &str, goal: i64) -> Result<()> {
    let (year, month) = calendar::parse_month(month)?;

    let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout);
    let entries = fetch_entries(&api, email).await?;
    let buckets = calendar::bucket_by_day(&entries);

    let view = calendar::month_view(year, month, &buckets, goal)?;
    let streaks = calendar::streaks(&buckets, Utc::now().date_naive());

    println!("{}-{:02} (goal {} reps/day)", view.year, view.month, view.daily_goal);
    print!("{}", view.render());
    println!();
    println!("Active days: {} | reps this month: {}", view.active_days(), view.total_reps());
    println!("Current streak: {} days | longest: {} days", streaks.current, streaks.longest);

    let today = Utc::now().date_naive();
    if today.year() == year && today.month() == month {
        if let Some(day) = view.days.iter().find(|d| d.date == today) {
            println!("Today: {} reps in {} sessions", day.total_reps, day.sessions);
        }
    }

    Ok(())
}

async fn show_summary(config: &TrainerConfig, email: &str) -> Result<()> {
    let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout);

    let summary = api.workout_summary(email).await?;
    let totals = api.workout_totals(email).await?;

    println!("{}", summary.email);
    println!("  sessions:    {}", summary.total_sessions);
    println!("  active days: {}", summary.active_days);

    if totals.totals.is_empty() {
        println!("  {}", totals.message.as_deref().unwrap_or("No workouts yet"));
        return Ok(());
    }

    println!("  totals:");
    for (workout, reps) in &totals.totals {
        println!("    {:<10} {}", workout, reps);
    }

    let scores = MuscleGroupScores::from_totals(&totals.totals, DEFAULT_TARGET_REPS, DEFAULT_MAX_SCORE);
    let overall = scores.overall_score(DEFAULT_MAX_SCORE);
    println!("  muscle groups:");
    for (group, score) in scores.as_array() {
        println!("    {:<10} {:>5.1}", group, score);
    }
    println!("  overall:     {}% ({})", overall, ScoreBand::for_score(overall).label());

    Ok(())
}
