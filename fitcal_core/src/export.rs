//! CSV export of sessions and scheduled workouts.
//!
//! Each export is written to a temporary file next to the destination,
//! synced to disk, then renamed into place, so a crash never leaves a
//! half-written CSV behind.

use crate::store::Stored;
use crate::{Result, ScheduledWorkoutRecord, WorkoutSessionRecord};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the sessions CSV
#[derive(Debug, Serialize)]
struct SessionRow<'a> {
    id: &'a str,
    workout_id: &'a str,
    workout_name: &'a str,
    completed_date: String,
    duration_minutes: u32,
    calories_burned: u32,
    exercises_completed: usize,
    rating: u8,
    notes: &'a str,
}

impl SessionRow<'_> {
    const HEADERS: [&'static str; 9] = [
        "id",
        "workout_id",
        "workout_name",
        "completed_date",
        "duration_minutes",
        "calories_burned",
        "exercises_completed",
        "rating",
        "notes",
    ];
}

impl<'a> From<&'a Stored<WorkoutSessionRecord>> for SessionRow<'a> {
    fn from(stored: &'a Stored<WorkoutSessionRecord>) -> Self {
        let summary = &stored.record.summary;
        SessionRow {
            id: &stored.id,
            workout_id: &summary.workout_id,
            workout_name: &summary.workout_name,
            completed_date: summary.completed_date.to_rfc3339(),
            duration_minutes: summary.duration_minutes,
            calories_burned: summary.calories_burned,
            exercises_completed: stored.record.exercises_completed.len(),
            rating: summary.rating,
            notes: &summary.notes,
        }
    }
}

/// A row in the schedule CSV
#[derive(Debug, Serialize)]
struct ScheduleRow<'a> {
    id: &'a str,
    workout_name: &'a str,
    workout_type: String,
    scheduled_date: String,
    scheduled_time: String,
    status: String,
    reminder_enabled: bool,
    notes: &'a str,
}

impl ScheduleRow<'_> {
    const HEADERS: [&'static str; 8] = [
        "id",
        "workout_name",
        "workout_type",
        "scheduled_date",
        "scheduled_time",
        "status",
        "reminder_enabled",
        "notes",
    ];
}

impl<'a> From<&'a Stored<ScheduledWorkoutRecord>> for ScheduleRow<'a> {
    fn from(stored: &'a Stored<ScheduledWorkoutRecord>) -> Self {
        let record = &stored.record;
        ScheduleRow {
            id: &stored.id,
            workout_name: &record.workout.workout_name,
            workout_type: record.workout.workout_type.to_string(),
            scheduled_date: record.scheduled_date.to_string(),
            scheduled_time: record.scheduled_time.format("%H:%M").to_string(),
            status: record.status.to_string(),
            reminder_enabled: record.reminder_enabled,
            notes: record.notes.as_deref().unwrap_or(""),
        }
    }
}

/// Write finished sessions to `path`. Returns the number of rows.
pub fn export_sessions_csv(sessions: &[Stored<WorkoutSessionRecord>], path: &Path) -> Result<usize> {
    write_rows(path, &SessionRow::HEADERS, sessions.iter().map(SessionRow::from))
}

/// Write scheduled workouts to `path`. Returns the number of rows.
pub fn export_schedule_csv(records: &[Stored<ScheduledWorkoutRecord>], path: &Path) -> Result<usize> {
    write_rows(path, &ScheduleRow::HEADERS, records.iter().map(ScheduleRow::from))
}

/// Header first, even when there are no rows
fn write_rows<T, I>(path: &Path, headers: &[&str], rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(temp);
    writer.write_record(headers)?;

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }

    // Flush and sync before the rename
    writer.flush()?;
    let mut temp = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    tracing::info!("Exported {} rows to {:?}", count, path);
    Ok(count)
}
