//! Workout plan parser - converts program markdown into a typed plan
//!
//! Single pass over the document. Unrecognized lines are skipped; there is no
//! error recovery beyond that.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::plan::{Category, Exercise, Reps, WeightUnit, WorkoutDay, WorkoutPlan};

static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^## DAY (\d+): (.+)$").unwrap());
static REST_DAY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^## DAY (\d+)").unwrap());
static EXERCISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \*\*(M\d+|[A-Z]\d+)\*\*: (.+) \((.+)\)$").unwrap());
static REPS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+-\d+|\d+) reps").unwrap());
static SETS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+) sets?").unwrap());
static TEMPO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Tempo: ([0-9]+)").unwrap());
static REST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Rest: (\d+)s").unwrap());
static WEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*Recommended weight: (\d+) (lbs?|kgs?)\*").unwrap());

/// Parse a workout program from its markdown source
pub fn parse_workout_plan(markdown: &str) -> WorkoutPlan {
    let lines: Vec<&str> = markdown
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut plan = WorkoutPlan::new("Default Workout Plan");
    let mut current_day: Option<WorkoutDay> = None;
    let mut current_category = Category::Main;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        // Plan name (h1)
        if let Some(name) = line.strip_prefix("# ") {
            plan.name = name.trim().to_string();
            i += 1;
            continue;
        }

        // Workout day (h2)
        if line.starts_with("## DAY ") {
            if let Some(day) = current_day.take() {
                plan.days.push(day);
            }

            if line.contains("REST DAY") {
                let day_number = REST_DAY_RE
                    .captures(line)
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(plan.days.len() as u32 + 1);
                current_day = Some(WorkoutDay {
                    id: Uuid::new_v4().to_string(),
                    name: "Rest Day".to_string(),
                    day: day_number,
                    exercises: Vec::new(),
                });
            } else if let Some(caps) = DAY_RE.captures(line) {
                current_day = Some(WorkoutDay {
                    id: Uuid::new_v4().to_string(),
                    name: caps[2].trim().to_string(),
                    day: caps[1].parse().unwrap_or(0),
                    exercises: Vec::new(),
                });
            }

            current_category = Category::Main;
            i += 1;
            continue;
        }

        // Category (h3)
        if let Some(heading) = line.strip_prefix("### ") {
            let heading = heading.trim().to_lowercase();
            current_category = if heading.contains("mobility") || heading.contains("warm-up") {
                Category::Mobility
            } else if heading.contains("main") {
                Category::Main
            } else {
                Category::Auxiliary
            };
            i += 1;
            continue;
        }

        // Exercise bullet
        if line.starts_with("- **")
            && let Some(day) = current_day.as_mut()
            && let Some(caps) = EXERCISE_RE.captures(line)
        {
            let group = caps[1].trim().to_string();
            let name = caps[2].trim().to_string();
            let params = caps[3].trim().to_string();

            let reps = parse_reps(&params);
            let sets = SETS_RE
                .captures(&params)
                .and_then(|c| c[1].parse().ok())
                .unwrap_or(1);
            let tempo = TEMPO_RE.captures(&params).map(|c| c[1].to_string());
            let rest_secs = REST_RE.captures(&params).and_then(|c| c[1].parse().ok());

            // Notes on the following emphasized line, unless it carries
            // the recommended weight
            let mut notes = None;
            if i + 1 < lines.len()
                && lines[i + 1].starts_with('*')
                && !WEIGHT_RE.is_match(lines[i + 1])
            {
                notes = Some(lines[i + 1].trim_matches('*').trim().to_string());
                i += 1;
            }

            // Recommended weight within the next two content lines
            let mut weight = None;
            let mut weight_unit = None;
            for next in lines.iter().skip(i + 1).take(2) {
                if let Some(caps) = WEIGHT_RE.captures(next) {
                    weight = caps[1].parse().ok();
                    weight_unit = Some(if caps[2].starts_with("kg") {
                        WeightUnit::Kg
                    } else {
                        WeightUnit::Lb
                    });
                    break;
                }
            }

            day.exercises.push(Exercise {
                id: Uuid::new_v4().to_string(),
                name,
                sets,
                reps,
                group: Some(group),
                category: current_category,
                tempo,
                rest_secs,
                weight,
                weight_unit,
                notes,
            });
        }

        i += 1;
    }

    if let Some(day) = current_day {
        plan.days.push(day);
    }

    plan
}

fn parse_reps(params: &str) -> Reps {
    match REPS_RE.captures(params) {
        Some(caps) => {
            let spec = &caps[1];
            match spec.split_once('-') {
                Some((min, max)) => Reps::Range {
                    min: min.parse().unwrap_or(10),
                    max: max.parse().unwrap_or(10),
                },
                None => Reps::Fixed(spec.parse().unwrap_or(10)),
            }
        }
        None => Reps::Fixed(10),
    }
}
