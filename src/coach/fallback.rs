//! Rule-based suggestion generator, used when the coach API is unavailable

use serde_json::json;

use super::openai::{CoachResponse, ExerciseModification, Parameter, ProgressionChange};
use crate::tracker::{Difficulty, ExercisePerformance, FormQuality};

/// Deterministic suggestions from the most recent performance. `history`
/// is expected newest first, as produced by the tracker; None when empty.
pub fn suggestions(exercise_id: &str, history: &[ExercisePerformance]) -> Option<CoachResponse> {
    let latest = history.first()?;

    let current_weight = latest.weight;
    let unit = latest.weight_unit;
    let increment = unit.increment();

    let hit_targets = latest.hit_all_targets();
    let good_form = matches!(
        latest.form_quality,
        Some(FormQuality::Good) | Some(FormQuality::Excellent)
    );
    let too_easy = latest.difficulty == Some(Difficulty::TooEasy);

    let (recommended_weight, explanation) = if hit_targets && good_form {
        if too_easy {
            (
                current_weight + increment,
                format!(
                    "You completed all sets and reps with good form and found it too easy. \
                     Increasing weight by {} {}.",
                    increment,
                    unit.label()
                ),
            )
        } else {
            (
                current_weight,
                "You completed your target with good form. Try to increase your reps by 1 \
                 on each set."
                    .to_string(),
            )
        }
    } else if !good_form {
        (
            (current_weight * 0.9).max(current_weight - increment),
            "Focus on improving your form by slightly reducing weight and maintaining \
             strict technique."
                .to_string(),
        )
    } else {
        (
            current_weight,
            "Continue with the same weight and reps, focusing on completing all sets and \
             reps with good form."
                .to_string(),
        )
    };

    Some(CoachResponse {
        explanation,
        modifications: vec![ExerciseModification {
            exercise_id: exercise_id.to_string(),
            changes: vec![ProgressionChange {
                parameter: Parameter::Weight,
                current_value: json!(current_weight),
                recommended_value: json!(recommended_weight),
                reasoning: "Based on your recent performance pattern".to_string(),
            }],
        }],
        program_adjustments: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::WeightUnit;

    fn perf(
        weight: f64,
        unit: WeightUnit,
        hit: bool,
        form: Option<FormQuality>,
        difficulty: Option<Difficulty>,
    ) -> ExercisePerformance {
        let mut p = ExercisePerformance::empty("bench-1");
        p.weight = weight;
        p.weight_unit = unit;
        p.target_sets = 3;
        p.target_reps = vec![5, 5, 5];
        p.completed_sets = 3;
        p.completed_reps = if hit { vec![5, 5, 5] } else { vec![5, 5, 3] };
        p.form_quality = form;
        p.difficulty = difficulty;
        p
    }

    fn recommended_weight(response: &CoachResponse) -> f64 {
        response.modifications[0].changes[0]
            .recommended_value
            .as_f64()
            .unwrap()
    }

    #[test]
    fn test_too_easy_adds_increment() {
        let history = vec![perf(
            135.0,
            WeightUnit::Lb,
            true,
            Some(FormQuality::Good),
            Some(Difficulty::TooEasy),
        )];
        let response = suggestions("bench-1", &history).unwrap();
        assert_eq!(recommended_weight(&response), 140.0);
        assert!(response.explanation.contains("Increasing weight by 5 lb"));
    }

    #[test]
    fn test_kg_increment_is_smaller() {
        let history = vec![perf(
            60.0,
            WeightUnit::Kg,
            true,
            Some(FormQuality::Excellent),
            Some(Difficulty::TooEasy),
        )];
        let response = suggestions("bench-1", &history).unwrap();
        assert_eq!(recommended_weight(&response), 62.5);
    }

    #[test]
    fn test_targets_hit_holds_weight_and_bumps_reps() {
        let history = vec![perf(
            135.0,
            WeightUnit::Lb,
            true,
            Some(FormQuality::Good),
            Some(Difficulty::Appropriate),
        )];
        let response = suggestions("bench-1", &history).unwrap();
        assert_eq!(recommended_weight(&response), 135.0);
        assert!(response.explanation.contains("increase your reps by 1"));
    }

    #[test]
    fn test_poor_form_reduces_weight() {
        let history = vec![perf(
            135.0,
            WeightUnit::Lb,
            true,
            Some(FormQuality::Poor),
            None,
        )];
        let response = suggestions("bench-1", &history).unwrap();
        // max(135 * 0.9, 135 - 5) keeps the milder reduction
        assert_eq!(recommended_weight(&response), 130.0);
        assert!(response.explanation.contains("form"));
    }

    #[test]
    fn test_missed_reps_with_good_form_holds() {
        let history = vec![perf(
            135.0,
            WeightUnit::Lb,
            false,
            Some(FormQuality::Good),
            Some(Difficulty::TooHard),
        )];
        let response = suggestions("bench-1", &history).unwrap();
        assert_eq!(recommended_weight(&response), 135.0);
        assert!(response.explanation.contains("same weight"));
    }

    #[test]
    fn test_empty_history_yields_nothing() {
        assert!(suggestions("bench-1", &[]).is_none());
    }

    #[test]
    fn test_always_produces_weight_change() {
        let history = vec![perf(100.0, WeightUnit::Lb, false, None, None)];
        let response = suggestions("bench-1", &history).unwrap();
        assert_eq!(response.modifications.len(), 1);
        assert_eq!(
            response.modifications[0].changes[0].parameter,
            Parameter::Weight
        );
        assert!(response.program_adjustments.is_none());
    }
}
