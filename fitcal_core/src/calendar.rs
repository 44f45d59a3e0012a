//! Calendar operations against the record store.
//!
//! Wraps the pure [`ScheduleExpander`] with request validation, persistence
//! and the queries used to show a user's calendar.

use crate::schedule::ScheduleExpander;
use crate::store::{Filter, RecordStore, SortKey, Stored};
use crate::{Error, RecurrenceRule, Result, ScheduleRequest, ScheduleStatus, ScheduledWorkoutRecord};
use chrono::{Duration, NaiveDate};
use serde_json::json;

/// Caller-level checks that must pass before expansion
pub fn validate_request(request: &ScheduleRequest) -> Result<()> {
    if request.workout.workout_id.trim().is_empty() || request.workout.workout_name.trim().is_empty() {
        return Err(Error::Validation("a workout must be selected".into()));
    }
    if request.user_email.trim().is_empty() {
        return Err(Error::Validation("schedule has no owner".into()));
    }
    Ok(())
}

/// Validate, expand and persist a scheduling request.
///
/// A one-off schedule is a single create; repeating schedules go through one
/// bulk create. A rule that matches no date stores nothing and returns an
/// empty list.
pub fn schedule_workout<S: RecordStore>(
    store: &mut S,
    expander: &ScheduleExpander,
    request: &ScheduleRequest,
) -> Result<Vec<Stored<ScheduledWorkoutRecord>>> {
    validate_request(request)?;

    let mut records = expander.expand(request);

    let stored = match (&request.recurrence, records.len()) {
        (_, 0) => {
            tracing::info!(
                "Schedule for {:?} matched no dates, nothing stored",
                request.workout.workout_name
            );
            Vec::new()
        }
        (RecurrenceRule::None, _) => match records.pop() {
            Some(record) => vec![store.create(record)?],
            None => Vec::new(),
        },
        _ => store.bulk_create(records)?,
    };

    tracing::info!(
        "Scheduled {} occurrence(s) of {:?}",
        stored.len(),
        request.workout.workout_name
    );
    Ok(stored)
}

/// Mark a scheduled workout completed or skipped. Status is the only field
/// that changes after creation.
pub fn set_status<S: RecordStore>(
    store: &mut S,
    id: &str,
    status: ScheduleStatus,
) -> Result<Stored<ScheduledWorkoutRecord>> {
    let updated = store.update(id, json!({ "status": status }))?;
    tracing::info!("Scheduled workout {} is now {}", id, status);
    Ok(updated)
}

/// All of a user's scheduled workouts, ordered by date
pub fn scheduled_for_user<S: RecordStore>(
    store: &S,
    user_email: &str,
) -> Result<Vec<Stored<ScheduledWorkoutRecord>>> {
    store.filter(
        &Filter::new().eq("user_email", user_email),
        Some(&SortKey::parse("scheduled_date")),
    )
}

/// Entries on one calendar day
pub fn on_date(
    records: &[Stored<ScheduledWorkoutRecord>],
    date: NaiveDate,
) -> Vec<&Stored<ScheduledWorkoutRecord>> {
    records
        .iter()
        .filter(|r| r.record.scheduled_date == date)
        .collect()
}

/// Still-pending entries from `today` on, at most `limit`
pub fn upcoming(
    records: &[Stored<ScheduledWorkoutRecord>],
    today: NaiveDate,
    limit: usize,
) -> Vec<&Stored<ScheduledWorkoutRecord>> {
    pending(records)
        .filter(|r| r.record.scheduled_date >= today)
        .take(limit)
        .collect()
}

/// Pending entries after `today` and within the next `days` days, at most `limit`
pub fn next_days(
    records: &[Stored<ScheduledWorkoutRecord>],
    today: NaiveDate,
    days: i64,
    limit: usize,
) -> Vec<&Stored<ScheduledWorkoutRecord>> {
    let horizon = today + Duration::days(days);
    pending(records)
        .filter(|r| r.record.scheduled_date > today && r.record.scheduled_date <= horizon)
        .take(limit)
        .collect()
}

fn pending(
    records: &[Stored<ScheduledWorkoutRecord>],
) -> impl Iterator<Item = &Stored<ScheduledWorkoutRecord>> {
    records
        .iter()
        .filter(|r| r.record.status == ScheduleStatus::Scheduled)
}
