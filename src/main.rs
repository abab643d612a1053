//! liftlog - structured workout program tracker with AI coaching

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand};

use liftlog::coach::openai::{CoachClient, CoachResponse};
use liftlog::coach::{ChatContext, CoachService, MessageRole, fallback};
use liftlog::db::Database;
use liftlog::plan::{Tempo, WorkoutDay, WorkoutPlan};
use liftlog::schedule;
use liftlog::tracker::{Tracker, WorkoutPerformance};
use liftlog::tui::App;

const DB_PATH: &str = "liftlog.db";
const DEFAULT_PLAN: &str = include_str!("../plans/sample.md");

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Structured workout program tracker with AI coaching")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Import a workout plan from a markdown file
    Plan {
        /// Path to the plan markdown
        file: std::path::PathBuf,
    },

    /// Print the active workout plan
    Show,

    /// Show the week calendar
    Week {
        /// Weeks from the current one (negative for past)
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        offset: i64,
    },

    /// Show today's scheduled workout
    Today,

    /// Print the session sheet for a workout day
    Start {
        /// Day number (1-7) or day name (e.g. "Upper Body A")
        day: String,
    },

    /// Log one exercise's result in today's session
    Log {
        /// Day number (1-7) or day name
        day: String,

        /// Exercise name as it appears in the plan
        exercise: String,

        /// Weight used
        #[arg(short, long)]
        weight: f64,

        /// Completed reps per set, comma separated (e.g. 8,8,7)
        #[arg(short, long, value_delimiter = ',')]
        reps: Vec<u32>,

        /// Rate of perceived exertion, 1-10
        #[arg(long)]
        rpe: Option<u8>,

        /// Optional notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show logged history for an exercise
    History {
        /// Exercise name
        exercise: String,

        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// AI suggestions for the next session of an exercise
    Suggest {
        /// Exercise name
        exercise: String,
    },

    /// Send session feedback and get workout modification proposals
    Feedback {
        /// Day number (1-7) or day name
        day: String,

        /// What happened (e.g. "shoulder felt tweaky on pressing")
        message: String,
    },

    /// Ask the AI coach
    Coach {
        /// Your message
        message: String,

        /// Start a new conversation instead of continuing the latest
        #[arg(long)]
        new: bool,
    },

    /// Show equipment profiles
    Equipment,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let db = Database::open(DB_PATH)?;
    let tracker = Tracker::new(&db);
    tracker.initialize(DEFAULT_PLAN)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(db)?;
            app.run()?;
        }

        Some(Commands::Plan { file }) => {
            let markdown = std::fs::read_to_string(&file)?;
            let plan = tracker.load_plan_from_markdown(&markdown)?;
            println!("Imported: {} ({} days)", plan.name, plan.days.len());
        }

        Some(Commands::Show) => {
            let plan = active_plan(&tracker)?;
            print_plan(&plan);
        }

        Some(Commands::Week { offset }) => {
            let plan = active_plan(&tracker)?;
            let (start, end) = schedule::week_range(offset);
            println!("Week {} - {}", start, end);
            println!("{:-<50}", "");
            for day in schedule::week_days(offset) {
                let workout = schedule::workout_for_date(&plan, day.date)
                    .map(|w| w.name.clone())
                    .unwrap_or_else(|| "Rest".to_string());
                let marker = if day.is_today { "*" } else { " " };
                println!("{} {} {:2} | {}", marker, day.day_name, day.day_number, workout);
            }
        }

        Some(Commands::Today) => {
            let plan = active_plan(&tracker)?;
            let today = Local::now().date_naive();
            match schedule::workout_for_date(&plan, today) {
                Some(day) if !day.is_rest_day() => print_day(day),
                _ => println!("Rest day - nothing scheduled."),
            }
        }

        Some(Commands::Start { day }) => {
            let plan = active_plan(&tracker)?;
            let day = resolve_day(&plan, &day)?;
            let template = tracker.performance_template(&day.id)?;
            print_session(day, &template);
        }

        Some(Commands::Log { day, exercise, weight, reps, rpe, notes }) => {
            let plan = active_plan(&tracker)?;
            let day = resolve_day(&plan, &day)?.clone();
            let ex = day
                .exercises
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(&exercise))
                .ok_or_else(|| anyhow!("{} has no exercise named {:?}", day.name, exercise))?;
            let performance =
                tracker.log_exercise(&day, &ex.id, weight, reps.clone(), rpe, notes)?;
            let unit = ex.weight_unit.map(|u| u.label()).unwrap_or("lb");
            println!(
                "Logged: {} - {} {} x {:?} (session {})",
                ex.name, weight, unit, reps, performance.id
            );
        }

        Some(Commands::History { exercise, limit }) => {
            let plan = active_plan(&tracker)?;
            let ex = plan
                .exercise_by_name(&exercise)
                .ok_or_else(|| anyhow!("no exercise named {:?} in the plan", exercise))?;
            let history = tracker.exercise_history(&ex.id, limit)?;
            if history.is_empty() {
                println!("No history for {} yet.", ex.name);
            } else {
                println!("History for {}:", ex.name);
                println!("{:-<60}", "");
                for entry in history {
                    println!(
                        "{} | {:6} {} | sets {}/{} | reps {:?}{}",
                        entry.workout_date.as_deref().unwrap_or("-"),
                        entry.weight,
                        entry.weight_unit.label(),
                        entry.completed_sets,
                        entry.target_sets,
                        entry.completed_reps,
                        entry
                            .rpe
                            .map(|r| format!(" | RPE {}", r))
                            .unwrap_or_default(),
                    );
                }
            }
        }

        Some(Commands::Suggest { exercise }) => {
            let plan = active_plan(&tracker)?;
            let ex = plan
                .exercise_by_name(&exercise)
                .ok_or_else(|| anyhow!("no exercise named {:?} in the plan", exercise))?;
            let history = tracker.exercise_history(&ex.id, 10)?;
            if history.is_empty() {
                println!("No history for {} yet - log a session first.", ex.name);
                return Ok(());
            }

            let response = match CoachClient::from_env() {
                Ok(client) => client.performance_suggestions(&ex.id, &history).await,
                Err(err) => {
                    tracing::warn!(error = %err, "coach API not configured, using fallback rules");
                    fallback::suggestions(&ex.id, &history)
                }
            };

            match response {
                Some(response) => print_suggestions(&ex.name, &response),
                None => println!("No suggestions available."),
            }
        }

        Some(Commands::Feedback { day, message }) => {
            let plan = active_plan(&tracker)?;
            let day = resolve_day(&plan, &day)?;
            let performance = db
                .latest_performance_for_day(&day.id)?
                .ok_or_else(|| anyhow!("no logged sessions for {} yet", day.name))?;
            let client = CoachClient::from_env()?;
            let profile = db.default_profile()?;
            match client
                .workout_modifications(&performance, &message, profile.as_ref())
                .await
            {
                Some(response) => print_suggestions(&day.name, &response),
                None => println!("No modifications available right now."),
            }
        }

        Some(Commands::Coach { message, new }) => {
            let client = CoachClient::from_env()?;
            let coach = CoachService::new(&db);

            let conversation = if new {
                None
            } else {
                coach.latest_conversation()?
            };
            let conversation = match conversation {
                Some(conversation) => {
                    coach.add_message(&conversation.id, MessageRole::User, &message)?;
                    coach
                        .conversation(&conversation.id)?
                        .ok_or_else(|| anyhow!("conversation disappeared"))?
                }
                None => {
                    let context = ChatContext {
                        recent_workouts: db.performances()?.into_iter().take(5).collect(),
                        equipment_profile: db.default_profile()?,
                        ..Default::default()
                    };
                    coach.create_conversation(Some(&message), context)?
                }
            };

            let reply = client
                .send_coach_message(&conversation.messages, &conversation.context)
                .await;
            coach.add_message(&conversation.id, MessageRole::Assistant, &reply)?;
            println!("{}", reply);
        }

        Some(Commands::Equipment) => {
            let profiles = db.profiles()?;
            for profile in profiles {
                let default = if profile.is_default { " (default)" } else { "" };
                println!("{}{} - {}", profile.name, default, profile.location);
                for constraint in &profile.constraints {
                    let scope = constraint.exercise_id.as_deref().unwrap_or("all exercises");
                    println!(
                        "  {}: min {:?} max {:?} step {:?}",
                        scope,
                        constraint.min_weight,
                        constraint.max_weight,
                        constraint.increment_size
                    );
                }
            }
        }
    }

    Ok(())
}

fn active_plan(tracker: &Tracker) -> Result<WorkoutPlan> {
    tracker
        .active_plan()?
        .ok_or_else(|| anyhow!("no workout plan loaded - run `liftlog plan <file>`"))
}

/// A day spec is either a 1-7 weekday number or the day's name
fn resolve_day<'a>(plan: &'a WorkoutPlan, spec: &str) -> Result<&'a WorkoutDay> {
    let found = match spec.parse::<u32>() {
        Ok(n) => plan.day_for_weekday(n),
        Err(_) => plan.day_by_name(spec),
    };
    match found {
        Some(day) => Ok(day),
        None => {
            let names: Vec<&str> = plan.days.iter().map(|d| d.name.as_str()).collect();
            bail!(
                "no workout day matching {:?}; available days are: {}",
                spec,
                names.join(", ")
            )
        }
    }
}

fn print_plan(plan: &WorkoutPlan) {
    println!("{}", plan.name);
    println!("{:=<60}", "");
    for day in &plan.days {
        println!();
        print_day(day);
    }
}

fn print_day(day: &WorkoutDay) {
    println!("DAY {}: {}", day.day, day.name);
    for ex in &day.exercises {
        let group = ex.group.as_deref().unwrap_or("-");
        let mut line = format!(
            "  {:3} {} - {} sets x {} reps",
            group,
            ex.name,
            ex.sets,
            ex.reps.describe()
        );
        if let Some(tempo) = &ex.tempo
            && let Ok(tempo) = Tempo::parse(tempo)
        {
            line.push_str(&format!(" | tempo {}", tempo.describe()));
        }
        if let Some(rest) = ex.rest_secs {
            line.push_str(&format!(" | rest {}s", rest));
        }
        if let (Some(weight), Some(unit)) = (ex.weight, ex.weight_unit) {
            line.push_str(&format!(" | {} {}", weight, unit.label()));
        }
        println!("{}", line);
        if let Some(notes) = &ex.notes {
            println!("      {}", notes);
        }
    }
}

fn print_session(day: &WorkoutDay, template: &WorkoutPerformance) {
    println!("Session sheet: {} ({})", day.name, template.date);
    println!("{:-<60}", "");
    for (ex, perf) in day.exercises.iter().zip(&template.exercises) {
        println!(
            "  {} - {} {} | targets {:?}",
            ex.name,
            perf.weight,
            perf.weight_unit.label(),
            perf.target_reps
        );
    }
}

fn print_suggestions(exercise_name: &str, response: &CoachResponse) {
    println!("Suggestions for {}", exercise_name);
    println!("{:-<60}", "");
    println!("{}", response.explanation);
    for modification in &response.modifications {
        for change in &modification.changes {
            println!(
                "  {:?}: {} -> {} ({})",
                change.parameter,
                change.current_value,
                change.recommended_value,
                change.reasoning
            );
        }
    }
    if let Some(adjustment) = &response.program_adjustments {
        println!(
            "Program adjustment: {:?} for {} week(s) - {}",
            adjustment.kind, adjustment.duration_weeks, adjustment.details
        );
    }
}
