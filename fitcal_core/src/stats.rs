//! Dashboard aggregates over a user's finished sessions.

use crate::store::Stored;
use crate::WorkoutSessionRecord;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Counts shown on the dashboard
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_sessions: usize,
    /// Sessions completed in the Monday-started week containing today
    pub sessions_this_week: usize,
    pub total_calories: u64,
    /// Mean session length in whole minutes, 0 with no sessions
    pub average_duration_minutes: u32,
}

impl DashboardStats {
    pub fn compute(sessions: &[Stored<WorkoutSessionRecord>], today: NaiveDate) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }

        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let week_end = week_start + Duration::days(7);

        let sessions_this_week = sessions
            .iter()
            .map(|s| s.record.summary.completed_date.date_naive())
            .filter(|d| *d >= week_start && *d < week_end)
            .count();

        let total_calories = sessions
            .iter()
            .map(|s| s.record.summary.calories_burned as u64)
            .sum();

        let total_minutes: u64 = sessions
            .iter()
            .map(|s| s.record.summary.duration_minutes as u64)
            .sum();
        let count = sessions.len() as u64;

        Self {
            total_sessions: sessions.len(),
            sessions_this_week,
            total_calories,
            average_duration_minutes: ((total_minutes * 2 + count) / (count * 2)) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionSummary;
    use chrono::{TimeZone, Utc};

    fn session(day: u32, minutes: u32, calories: u32) -> Stored<WorkoutSessionRecord> {
        let completed = Utc.with_ymd_and_hms(2024, 3, day, 18, 0, 0).unwrap();
        Stored {
            id: format!("s-{}", day),
            created_date: completed,
            version: 1,
            record: WorkoutSessionRecord {
                user_email: "a@example.com".into(),
                summary: SessionSummary {
                    workout_id: "w".into(),
                    workout_name: "Leg Day".into(),
                    duration_minutes: minutes,
                    completed_date: completed,
                    calories_burned: calories,
                    notes: String::new(),
                    rating: 0,
                },
                exercises_completed: Vec::new(),
            },
        }
    }

    #[test]
    fn test_empty() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        assert_eq!(DashboardStats::compute(&[], today), DashboardStats::default());
    }

    #[test]
    fn test_counts_and_week_boundary() {
        // 2024-03-11 is a Monday
        let sessions = vec![
            session(10, 30, 100),
            session(11, 45, 0),
            session(13, 20, 50),
            session(17, 10, 0),
            session(18, 10, 0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();

        let stats = DashboardStats::compute(&sessions, today);
        assert_eq!(stats.total_sessions, 5);
        assert_eq!(stats.sessions_this_week, 3);
        assert_eq!(stats.total_calories, 150);
        // 115 / 5 = 23
        assert_eq!(stats.average_duration_minutes, 23);
    }

    #[test]
    fn test_average_rounds_half_up() {
        let sessions = vec![session(1, 10, 0), session(2, 11, 0)];
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(DashboardStats::compute(&sessions, today).average_duration_minutes, 11);
    }
}
