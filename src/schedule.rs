//! Schedule module - Monday-first week navigation over the plan

use chrono::{Datelike, Duration, Local, NaiveDate};

use crate::plan::{WorkoutDay, WorkoutPlan};

/// One calendar day in a week strip
#[derive(Debug, Clone)]
pub struct WeekDay {
    pub date: NaiveDate,
    /// Short weekday name (Mon, Tue, ...)
    pub day_name: String,
    /// Day of month
    pub day_number: u32,
    pub is_today: bool,
    /// YYYY-MM-DD
    pub iso_date: String,
}

/// Day of week as 1-7 with Monday = 1
pub fn weekday_number(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// The Monday of the week `offset` weeks from the current one
pub fn week_start(offset: i64) -> NaiveDate {
    let today = Local::now().date_naive();
    let back = weekday_number(today) as i64 - 1;
    today - Duration::days(back) + Duration::weeks(offset)
}

/// Seven days for the week `offset` weeks from the current one
pub fn week_days(offset: i64) -> Vec<WeekDay> {
    let today = Local::now().date_naive();
    let monday = week_start(offset);

    (0..7)
        .map(|i| {
            let date = monday + Duration::days(i);
            WeekDay {
                date,
                day_name: date.format("%a").to_string(),
                day_number: date.day(),
                is_today: date == today,
                iso_date: date.to_string(),
            }
        })
        .collect()
}

/// First and last date of the week `offset` weeks out
pub fn week_range(offset: i64) -> (NaiveDate, NaiveDate) {
    let monday = week_start(offset);
    (monday, monday + Duration::days(6))
}

/// The plan day scheduled on a calendar date, if any
pub fn workout_for_date(plan: &WorkoutPlan, date: NaiveDate) -> Option<&WorkoutDay> {
    plan.day_for_weekday(weekday_number(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::WorkoutDay;

    fn plan_with_days(days: &[(u32, &str)]) -> WorkoutPlan {
        let mut plan = WorkoutPlan::new("Test");
        for (day, name) in days {
            plan.days.push(WorkoutDay {
                id: format!("day-{}", day),
                name: name.to_string(),
                day: *day,
                exercises: vec![],
            });
        }
        plan
    }

    #[test]
    fn test_weekday_number_monday_first() {
        // 2026-08-24 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(weekday_number(monday), 1);
        let sunday = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert_eq!(weekday_number(sunday), 7);
    }

    #[test]
    fn test_week_days_shape() {
        let days = week_days(0);
        assert_eq!(days.len(), 7);
        assert_eq!(weekday_number(days[0].date), 1);
        assert_eq!(weekday_number(days[6].date), 7);
        assert_eq!(days.iter().filter(|d| d.is_today).count(), 1);
    }

    #[test]
    fn test_week_offset_shifts_by_seven_days() {
        let this_week = week_days(0);
        let next_week = week_days(1);
        assert_eq!(next_week[0].date - this_week[0].date, Duration::days(7));
        assert!(next_week.iter().all(|d| !d.is_today));
    }

    #[test]
    fn test_week_range_spans_monday_to_sunday() {
        let (start, end) = week_range(0);
        assert_eq!(end - start, Duration::days(6));
        assert_eq!(weekday_number(start), 1);
    }

    #[test]
    fn test_workout_for_date() {
        let plan = plan_with_days(&[(1, "Upper Body A"), (3, "Lower Body A")]);

        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(workout_for_date(&plan, monday).unwrap().name, "Upper Body A");

        let wednesday = NaiveDate::from_ymd_opt(2026, 8, 26).unwrap();
        assert_eq!(workout_for_date(&plan, wednesday).unwrap().name, "Lower Body A");

        let tuesday = NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        assert!(workout_for_date(&plan, tuesday).is_none());
    }
}
