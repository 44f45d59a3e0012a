//! Recurring-schedule expansion.
//!
//! Turns one [`ScheduleRequest`] into the dated [`ScheduledWorkoutRecord`]s
//! it resolves to:
//! - `none`: the start date only
//! - `daily`: every day from start to end, inclusive
//! - `weekly`: every day in range whose weekday is selected
//! - `monthly`: start, then every 30 days while within range
//!
//! Expansion is pure. Persisting the result is the caller's job.

use crate::{DayOfWeek, RecurrenceRule, ScheduleRequest, ScheduleStatus, ScheduledWorkoutRecord};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Horizon used when a repeating rule has no end date
pub const DEFAULT_HORIZON_DAYS: i64 = 90;

/// Longest open-ended horizon accepted, about ten years
pub const MAX_HORIZON_DAYS: i64 = 3650;

/// Stride of the `monthly` pattern. A fixed day count, not a calendar month.
pub const MONTHLY_STRIDE_DAYS: i64 = 30;

/// Expands scheduling requests into dated records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleExpander {
    horizon_days: i64,
}

impl Default for ScheduleExpander {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl ScheduleExpander {
    /// Expander with a custom open-ended horizon, clamped to `0..=MAX_HORIZON_DAYS`
    pub fn with_horizon_days(horizon_days: i64) -> Self {
        Self {
            horizon_days: horizon_days.clamp(0, MAX_HORIZON_DAYS),
        }
    }

    pub fn horizon_days(&self) -> i64 {
        self.horizon_days
    }

    /// Resolve the request's rule into dates and build one record per date.
    ///
    /// An empty result is not an error: it means the rule matched no day
    /// (for example a start date after the end date).
    pub fn expand(&self, request: &ScheduleRequest) -> Vec<ScheduledWorkoutRecord> {
        let dates = self.occurrences(request.start_date, &request.recurrence);

        tracing::debug!(
            "Expanded {} schedule for {:?} from {} into {} date(s)",
            request.recurrence.pattern_name(),
            request.workout.workout_name,
            request.start_date,
            dates.len()
        );

        dates
            .into_iter()
            .map(|date| record_for(request, date))
            .collect()
    }

    /// The ascending, distinct dates a rule resolves to
    pub fn occurrences(&self, start: NaiveDate, rule: &RecurrenceRule) -> Vec<NaiveDate> {
        let end = rule.end_date().unwrap_or_else(|| {
            start
                .checked_add_signed(Duration::days(self.horizon_days))
                .unwrap_or(NaiveDate::MAX)
        });

        match rule {
            RecurrenceRule::None => vec![start],
            RecurrenceRule::Daily { .. } => stride(start, end, 1).collect(),
            RecurrenceRule::Weekly { days_of_week, .. } => weekly(start, end, days_of_week),
            RecurrenceRule::Monthly { .. } => stride(start, end, MONTHLY_STRIDE_DAYS).collect(),
        }
    }
}

/// Expand with the default 90-day horizon
pub fn expand(request: &ScheduleRequest) -> Vec<ScheduledWorkoutRecord> {
    ScheduleExpander::default().expand(request)
}

/// Dates from `start` stepping by `step_days` while not past `end`
fn stride(start: NaiveDate, end: NaiveDate, step_days: i64) -> impl Iterator<Item = NaiveDate> {
    let step = Duration::days(step_days);
    std::iter::successors(Some(start), move |date| date.checked_add_signed(step))
        .take_while(move |date| *date <= end)
}

fn weekly(start: NaiveDate, end: NaiveDate, days: &BTreeSet<DayOfWeek>) -> Vec<NaiveDate> {
    if days.is_empty() {
        return Vec::new();
    }
    stride(start, end, 1)
        .filter(|date| days.contains(&DayOfWeek::from(date.weekday())))
        .collect()
}

fn record_for(request: &ScheduleRequest, date: NaiveDate) -> ScheduledWorkoutRecord {
    ScheduledWorkoutRecord {
        user_email: request.user_email.clone(),
        workout: request.workout.clone(),
        source_type: request.source,
        scheduled_date: date,
        scheduled_time: request.scheduled_time,
        notes: request.notes.clone(),
        reminder_enabled: request.reminder_enabled,
        status: ScheduleStatus::Scheduled,
    }
}
