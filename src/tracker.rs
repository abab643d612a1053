//! Tracker module - performance logging against the active plan

use anyhow::{Context, Result, anyhow};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Database;
use crate::equipment::EquipmentProfile;
use crate::parser::parse_workout_plan;
use crate::plan::{WeightUnit, WorkoutDay, WorkoutPlan};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormQuality {
    Poor,
    Good,
    Excellent,
}

impl FormQuality {
    pub fn label(&self) -> &'static str {
        match self {
            FormQuality::Poor => "poor",
            FormQuality::Good => "good",
            FormQuality::Excellent => "excellent",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    TooEasy,
    Appropriate,
    TooHard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::TooEasy => "too_easy",
            Difficulty::Appropriate => "appropriate",
            Difficulty::TooHard => "too_hard",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    Soreness,
    TimeConstraint,
    Equipment,
    Energy,
    Other,
}

impl Issue {
    pub fn label(&self) -> &'static str {
        match self {
            Issue::Soreness => "soreness",
            Issue::TimeConstraint => "time_constraint",
            Issue::Equipment => "equipment",
            Issue::Energy => "energy",
            Issue::Other => "other",
        }
    }
}

/// Logged outcome of a single exercise within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisePerformance {
    pub exercise_id: String,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub target_sets: u32,
    pub completed_sets: u32,
    pub target_reps: Vec<u32>,
    pub completed_reps: Vec<u32>,
    /// 1-10 scale
    pub rpe: Option<u8>,
    pub form_quality: Option<FormQuality>,
    pub difficulty: Option<Difficulty>,
    pub notes: Option<String>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Unix millis
    pub timestamp: i64,
    /// Stamped when flattened into a history view
    pub workout_date: Option<String>,
    pub workout_id: Option<String>,
}

impl ExercisePerformance {
    /// Zeroed record for an exercise, mostly for tests and templates
    pub fn empty(exercise_id: &str) -> Self {
        Self {
            exercise_id: exercise_id.to_string(),
            weight: 0.0,
            weight_unit: WeightUnit::Lb,
            target_sets: 0,
            completed_sets: 0,
            target_reps: Vec::new(),
            completed_reps: Vec::new(),
            rpe: None,
            form_quality: None,
            difficulty: None,
            notes: None,
            issues: Vec::new(),
            timestamp: 0,
            workout_date: None,
            workout_id: None,
        }
    }

    /// All prescribed sets done and every set hit its rep target
    pub fn hit_all_targets(&self) -> bool {
        self.completed_sets >= self.target_sets
            && self
                .completed_reps
                .iter()
                .enumerate()
                .all(|(i, reps)| *reps >= self.target_reps.get(i).copied().unwrap_or(0))
    }
}

/// One record per day performed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPerformance {
    pub id: String,
    pub workout_day_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub exercises: Vec<ExercisePerformance>,
    pub overall_feedback: Option<String>,
    /// 1-5
    pub overall_rating: Option<u8>,
    pub duration_mins: Option<u32>,
    pub timestamp: Option<i64>,
}

/// Performance logging service over the database
pub struct Tracker<'a> {
    db: &'a Database,
}

impl<'a> Tracker<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Parse a program markdown document and persist the plan
    pub fn load_plan_from_markdown(&self, markdown: &str) -> Result<WorkoutPlan> {
        let plan = parse_workout_plan(markdown);
        self.db.put_plan(&plan)?;
        tracing::info!(plan = %plan.name, days = plan.days.len(), "workout plan loaded");
        Ok(plan)
    }

    /// The active plan: the most recently stored one, so importing a new
    /// program takes over scheduling
    pub fn active_plan(&self) -> Result<Option<WorkoutPlan>> {
        Ok(self.db.plans()?.pop())
    }

    /// First-run setup: load the bundled program and a default equipment
    /// profile when the database is empty
    pub fn initialize(&self, default_plan_markdown: &str) -> Result<()> {
        if !self.db.plans()?.is_empty() {
            tracing::debug!("database already initialized, skipping");
            return Ok(());
        }
        self.load_plan_from_markdown(default_plan_markdown)?;
        self.db.put_profile(&EquipmentProfile::default_home())?;
        Ok(())
    }

    /// Persist a session record, filling id, date and timestamp when absent
    pub fn record_performance(&self, mut performance: WorkoutPerformance) -> Result<String> {
        if performance.id.is_empty() {
            performance.id = Uuid::new_v4().to_string();
        }
        if performance.date.is_empty() {
            performance.date = today();
        }
        performance.timestamp = Some(Utc::now().timestamp_millis());
        self.db.put_performance(&performance)?;
        Ok(performance.id)
    }

    /// Pre-populated session record for a workout day: targets from the plan,
    /// weights carried over from the latest prior session
    pub fn performance_template(&self, workout_day_id: &str) -> Result<WorkoutPerformance> {
        let plan = self
            .active_plan()?
            .ok_or_else(|| anyhow!("no active workout plan"))?;
        let day = plan
            .days
            .iter()
            .find(|d| d.id == workout_day_id)
            .with_context(|| format!("workout day {} not found", workout_day_id))?;

        let latest = self.db.latest_performance_for_day(workout_day_id)?;
        let now = Utc::now().timestamp_millis();

        let exercises = day
            .exercises
            .iter()
            .map(|exercise| {
                let previous = latest
                    .as_ref()
                    .and_then(|p| p.exercises.iter().find(|e| e.exercise_id == exercise.id));

                let weight = previous
                    .map(|p| p.weight)
                    .or(exercise.weight)
                    .unwrap_or(0.0);
                let weight_unit = previous
                    .map(|p| p.weight_unit)
                    .or(exercise.weight_unit)
                    .unwrap_or(WeightUnit::Lb);
                let target_reps = exercise.target_reps();

                ExercisePerformance {
                    exercise_id: exercise.id.clone(),
                    weight,
                    weight_unit,
                    target_sets: exercise.sets,
                    completed_sets: 0,
                    completed_reps: vec![0; target_reps.len()],
                    target_reps,
                    rpe: None,
                    form_quality: None,
                    difficulty: None,
                    notes: None,
                    issues: Vec::new(),
                    timestamp: now,
                    workout_date: None,
                    workout_id: None,
                }
            })
            .collect();

        Ok(WorkoutPerformance {
            id: Uuid::new_v4().to_string(),
            workout_day_id: workout_day_id.to_string(),
            date: today(),
            exercises,
            overall_feedback: None,
            overall_rating: None,
            duration_mins: None,
            timestamp: None,
        })
    }

    /// Stored record for a day and date, or a fresh template
    pub fn performance_for(&self, workout_day_id: &str, date: &str) -> Result<WorkoutPerformance> {
        let stored = self
            .db
            .performances_for_day(workout_day_id)?
            .into_iter()
            .find(|p| p.date == date);
        match stored {
            Some(performance) => Ok(performance),
            None => self.performance_template(workout_day_id),
        }
    }

    /// Record one exercise's result in today's session for a workout day
    pub fn log_exercise(
        &self,
        day: &WorkoutDay,
        exercise_id: &str,
        weight: f64,
        completed_reps: Vec<u32>,
        rpe: Option<u8>,
        notes: Option<String>,
    ) -> Result<WorkoutPerformance> {
        let mut performance = self.performance_for(&day.id, &today())?;
        let entry = performance
            .exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
            .with_context(|| format!("exercise {} is not part of {}", exercise_id, day.name))?;

        entry.weight = weight;
        entry.completed_sets = completed_reps.len() as u32;
        entry.completed_reps = completed_reps;
        entry.rpe = rpe;
        if notes.is_some() {
            entry.notes = notes;
        }
        entry.timestamp = Utc::now().timestamp_millis();

        self.record_performance(performance.clone())?;
        Ok(performance)
    }

    /// Flattened per-exercise history across all sessions, newest first
    pub fn exercise_history(
        &self,
        exercise_id: &str,
        limit: usize,
    ) -> Result<Vec<ExercisePerformance>> {
        let mut history: Vec<ExercisePerformance> = self
            .db
            .performances()?
            .into_iter()
            .flat_map(|perf| {
                let date = perf.date.clone();
                let workout_id = perf.id.clone();
                perf.exercises
                    .into_iter()
                    .filter(|e| e.exercise_id == exercise_id)
                    .map(move |mut e| {
                        e.workout_date = Some(date.clone());
                        e.workout_id = Some(workout_id.clone());
                        e
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        history.sort_by(|a, b| b.workout_date.cmp(&a.workout_date));
        history.truncate(limit);
        Ok(history)
    }
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_MD: &str = "\
# Test Block

## DAY 1: Upper Body A

### Main Lifts
- **A1**: Bench Press (3 sets, 5 reps, Rest: 120s)
*Recommended weight: 135 lbs*
- **A2**: Row (3 sets, 8-10 reps)
";

    fn setup(db: &Database) -> WorkoutPlan {
        let tracker = Tracker::new(db);
        tracker.initialize(PLAN_MD).unwrap();
        tracker.active_plan().unwrap().unwrap()
    }

    #[test]
    fn test_initialize_loads_plan_and_profile() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        assert_eq!(plan.name, "Test Block");
        assert!(db.default_profile().unwrap().is_some());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        setup(&db);
        Tracker::new(&db).initialize(PLAN_MD).unwrap();
        assert_eq!(db.plans().unwrap().len(), 1);
    }

    #[test]
    fn test_imported_plan_becomes_active() {
        let db = Database::open_in_memory().unwrap();
        setup(&db);
        let tracker = Tracker::new(&db);

        tracker
            .load_plan_from_markdown(
                "# Imported Block\n\n## DAY 1: Push\n\n### Main Lifts\n\
                 - **A1**: Dip (3 sets, 8 reps)\n",
            )
            .unwrap();

        assert_eq!(tracker.active_plan().unwrap().unwrap().name, "Imported Block");
        assert_eq!(db.plans().unwrap().len(), 2);
    }

    #[test]
    fn test_template_uses_plan_targets() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let day = &plan.days[0];

        let template = Tracker::new(&db).performance_template(&day.id).unwrap();
        assert_eq!(template.workout_day_id, day.id);
        assert_eq!(template.exercises.len(), 2);

        let bench = &template.exercises[0];
        assert_eq!(bench.weight, 135.0);
        assert_eq!(bench.target_sets, 3);
        assert_eq!(bench.target_reps, vec![5, 5, 5]);
        assert_eq!(bench.completed_reps, vec![0, 0, 0]);
        assert_eq!(bench.completed_sets, 0);

        // Range reps expand to the full sequence
        let row = &template.exercises[1];
        assert_eq!(row.target_reps, vec![8, 9, 10]);
        assert_eq!(row.weight, 0.0);
    }

    #[test]
    fn test_template_prefills_from_latest_session() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let day = &plan.days[0];
        let tracker = Tracker::new(&db);

        let mut performance = tracker.performance_template(&day.id).unwrap();
        performance.exercises[0].weight = 145.0;
        performance.date = "2026-08-17".to_string();
        tracker.record_performance(performance).unwrap();

        let template = tracker.performance_template(&day.id).unwrap();
        assert_eq!(template.exercises[0].weight, 145.0);
    }

    #[test]
    fn test_record_performance_fills_identity() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let tracker = Tracker::new(&db);

        let mut performance = tracker.performance_template(&plan.days[0].id).unwrap();
        performance.id = String::new();
        performance.date = String::new();

        let id = tracker.record_performance(performance).unwrap();
        assert!(!id.is_empty());
        let stored = db.performances().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].date.is_empty());
        assert!(stored[0].timestamp.is_some());
    }

    #[test]
    fn test_log_exercise_updates_todays_session() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let day = plan.days[0].clone();
        let tracker = Tracker::new(&db);
        let bench_id = day.exercises[0].id.clone();

        let performance = tracker
            .log_exercise(&day, &bench_id, 140.0, vec![5, 5, 4], Some(8), None)
            .unwrap();

        let bench = &performance.exercises[0];
        assert_eq!(bench.weight, 140.0);
        assert_eq!(bench.completed_sets, 3);
        assert_eq!(bench.completed_reps, vec![5, 5, 4]);
        assert_eq!(bench.rpe, Some(8));

        // Logging again the same day updates the same session record
        tracker
            .log_exercise(&day, &bench_id, 140.0, vec![5, 5, 5], Some(8), None)
            .unwrap();
        assert_eq!(db.performances().unwrap().len(), 1);
    }

    #[test]
    fn test_log_exercise_unknown_exercise() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let tracker = Tracker::new(&db);
        assert!(
            tracker
                .log_exercise(&plan.days[0], "nope", 100.0, vec![5], None, None)
                .is_err()
        );
    }

    #[test]
    fn test_exercise_history_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let plan = setup(&db);
        let day = &plan.days[0];
        let tracker = Tracker::new(&db);
        let bench_id = day.exercises[0].id.clone();

        for (date, weight) in [("2026-08-03", 130.0), ("2026-08-10", 135.0)] {
            let mut performance = tracker.performance_template(&day.id).unwrap();
            performance.date = date.to_string();
            performance.exercises[0].weight = weight;
            tracker.record_performance(performance).unwrap();
        }

        let history = tracker.exercise_history(&bench_id, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].workout_date.as_deref(), Some("2026-08-10"));
        assert_eq!(history[0].weight, 135.0);
        assert!(history[0].workout_id.is_some());

        let limited = tracker.exercise_history(&bench_id, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_hit_all_targets() {
        let mut perf = ExercisePerformance::empty("ex");
        perf.target_sets = 3;
        perf.target_reps = vec![5, 5, 5];
        perf.completed_sets = 3;
        perf.completed_reps = vec![5, 5, 5];
        assert!(perf.hit_all_targets());

        perf.completed_reps = vec![5, 5, 4];
        assert!(!perf.hit_all_targets());
    }
}
