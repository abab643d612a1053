//! Workout plan model - program definition, rep schemes, tempo codes

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exercise category within a workout day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Mobility,
    Main,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lb,
    Kg,
}

impl WeightUnit {
    /// Smallest sensible load step for this unit (standard plates/dumbbells)
    pub fn increment(&self) -> f64 {
        match self {
            WeightUnit::Lb => 5.0,
            WeightUnit::Kg => 2.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::Kg => "kg",
        }
    }
}

/// Prescribed repetitions: a fixed count or an inclusive range (e.g. 8-12)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Reps {
    Fixed(u32),
    Range { min: u32, max: u32 },
}

impl Reps {
    pub fn describe(&self) -> String {
        match self {
            Reps::Fixed(n) => n.to_string(),
            Reps::Range { min, max } => format!("{}-{}", min, max),
        }
    }
}

/// One exercise prescription inside a workout day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: u32,
    pub reps: Reps,
    /// Superset/order group code from the plan (A1, A2, M1, ...)
    pub group: Option<String>,
    pub category: Category,
    /// Four-digit tempo code, e.g. "3010"
    pub tempo: Option<String>,
    pub rest_secs: Option<u32>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub notes: Option<String>,
}

impl Exercise {
    /// Per-set rep targets. Fixed reps repeat for every set; a range expands
    /// to the full min..=max sequence.
    pub fn target_reps(&self) -> Vec<u32> {
        match self.reps {
            Reps::Fixed(n) => vec![n; self.sets as usize],
            Reps::Range { min, max } => (min..=max).collect(),
        }
    }
}

/// One scheduled training session with an ordered exercise list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub id: String,
    pub name: String,
    /// Day of week, 1-7 with Monday = 1
    pub day: u32,
    pub exercises: Vec<Exercise>,
}

impl WorkoutDay {
    pub fn is_rest_day(&self) -> bool {
        self.exercises.is_empty()
    }
}

/// Static program definition, immutable once parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub days: Vec<WorkoutDay>,
}

impl WorkoutPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            days: Vec::new(),
        }
    }

    /// Find a day by its 1-7 weekday number
    pub fn day_for_weekday(&self, weekday: u32) -> Option<&WorkoutDay> {
        self.days.iter().find(|d| d.day == weekday)
    }

    /// Find a day by exact name, case-insensitive
    pub fn day_by_name(&self, name: &str) -> Option<&WorkoutDay> {
        self.days.iter().find(|d| d.name.eq_ignore_ascii_case(name))
    }

    pub fn find_exercise(&self, exercise_id: &str) -> Option<&Exercise> {
        self.days
            .iter()
            .flat_map(|d| d.exercises.iter())
            .find(|e| e.id == exercise_id)
    }

    /// Find an exercise by exact name, case-insensitive
    pub fn exercise_by_name(&self, name: &str) -> Option<&Exercise> {
        self.days
            .iter()
            .flat_map(|d| d.exercises.iter())
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

/// Decoded four-digit lifting tempo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tempo {
    pub eccentric: u32,
    pub pause_bottom: u32,
    pub concentric: u32,
    pub pause_top: u32,
}

impl Tempo {
    /// Decode a tempo code like "3020": lowering, bottom pause, lifting, top pause
    pub fn parse(code: &str) -> Result<Self> {
        let digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
        if code.chars().count() != 4 || digits.len() != 4 {
            bail!("invalid tempo code {:?}: must be 4 digits", code);
        }
        Ok(Self {
            eccentric: digits[0],
            pause_bottom: digits[1],
            concentric: digits[2],
            pause_top: digits[3],
        })
    }

    /// Human-readable description, pauses included only when nonzero
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("{}s down", self.eccentric)];
        if self.pause_bottom > 0 {
            parts.push(format!("{}s pause at bottom", self.pause_bottom));
        }
        parts.push(format!("{}s up", self.concentric));
        if self.pause_top > 0 {
            parts.push(format!("{}s pause at top", self.pause_top));
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(sets: u32, reps: Reps) -> Exercise {
        Exercise {
            id: "ex-1".to_string(),
            name: "Goblet Squat".to_string(),
            sets,
            reps,
            group: Some("A1".to_string()),
            category: Category::Main,
            tempo: None,
            rest_secs: None,
            weight: None,
            weight_unit: None,
            notes: None,
        }
    }

    #[test]
    fn test_tempo_parse() {
        let tempo = Tempo::parse("3020").unwrap();
        assert_eq!(tempo.eccentric, 3);
        assert_eq!(tempo.pause_bottom, 0);
        assert_eq!(tempo.concentric, 2);
        assert_eq!(tempo.pause_top, 0);
    }

    #[test]
    fn test_tempo_parse_rejects_short_code() {
        assert!(Tempo::parse("302").is_err());
    }

    #[test]
    fn test_tempo_parse_rejects_non_digits() {
        assert!(Tempo::parse("30x0").is_err());
    }

    #[test]
    fn test_tempo_describe_skips_zero_pauses() {
        let tempo = Tempo::parse("3010").unwrap();
        assert_eq!(tempo.describe(), "3s down, 1s up");
    }

    #[test]
    fn test_tempo_describe_full() {
        let tempo = Tempo::parse("3121").unwrap();
        assert_eq!(
            tempo.describe(),
            "3s down, 1s pause at bottom, 2s up, 1s pause at top"
        );
    }

    #[test]
    fn test_target_reps_fixed() {
        let ex = exercise(3, Reps::Fixed(10));
        assert_eq!(ex.target_reps(), vec![10, 10, 10]);
    }

    #[test]
    fn test_target_reps_range_expands() {
        let ex = exercise(3, Reps::Range { min: 8, max: 12 });
        assert_eq!(ex.target_reps(), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_day_lookup_case_insensitive() {
        let mut plan = WorkoutPlan::new("Test");
        plan.days.push(WorkoutDay {
            id: "d1".to_string(),
            name: "Upper Body A".to_string(),
            day: 1,
            exercises: vec![exercise(3, Reps::Fixed(10))],
        });

        assert!(plan.day_by_name("upper body a").is_some());
        assert!(plan.day_by_name("Lower Body").is_none());
        assert!(plan.day_for_weekday(1).is_some());
        assert!(plan.day_for_weekday(2).is_none());
    }

    #[test]
    fn test_rest_day() {
        let day = WorkoutDay {
            id: "d1".to_string(),
            name: "Rest Day".to_string(),
            day: 7,
            exercises: vec![],
        };
        assert!(day.is_rest_day());
    }

    #[test]
    fn test_weight_unit_increment() {
        assert_eq!(WeightUnit::Lb.increment(), 5.0);
        assert_eq!(WeightUnit::Kg.increment(), 2.5);
    }
}
