//! User-built routines ("plans").
//!
//! A plan is a named list of exercises owned by one user. Its duration is
//! estimated from the exercises whenever they change.

use crate::catalog::validate_exercises;
use crate::store::{Filter, RecordStore, SortKey, Stored};
use crate::{Difficulty, Error, Exercise, Result, WorkoutPlan, WorkoutType};
use serde_json::json;

/// Seconds of work counted for each rep
const SECONDS_PER_REP: u64 = 2;

/// Estimated minutes for a list of exercises.
///
/// Each exercise counts `sets * (reps * 2 + duration + rest)` seconds, rounded
/// up to whole minutes. Missing sets count as one, anything else missing as zero.
/// Absurd inputs saturate at `u32::MAX` minutes.
pub fn estimate_duration_minutes(exercises: &[Exercise]) -> u32 {
    let minutes = exercises
        .iter()
        .map(|e| {
            let sets = e.sets.unwrap_or(1) as u64;
            let per_set = (e.reps.unwrap_or(0) as u64 * SECONDS_PER_REP)
                + e.duration_seconds.unwrap_or(0) as u64
                + e.rest_seconds.unwrap_or(0) as u64;
            sets.saturating_mul(per_set).div_ceil(60)
        })
        .fold(0u64, u64::saturating_add);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

impl WorkoutPlan {
    /// Empty plan for `user_email`
    pub fn new(user_email: impl Into<String>, name: impl Into<String>, workout_type: WorkoutType) -> Self {
        Self {
            user_email: user_email.into(),
            name: name.into(),
            description: String::new(),
            workout_type,
            difficulty: Difficulty::default(),
            duration_minutes: 0,
            exercises: Vec::new(),
        }
    }

    pub fn add_exercise(&mut self, exercise: Exercise) {
        self.exercises.push(exercise);
        self.refresh_duration();
    }

    /// Remove the exercise at `index`, returning it
    pub fn remove_exercise(&mut self, index: usize) -> Option<Exercise> {
        if index >= self.exercises.len() {
            return None;
        }
        let removed = self.exercises.remove(index);
        self.refresh_duration();
        Some(removed)
    }

    pub fn refresh_duration(&mut self) {
        self.duration_minutes = estimate_duration_minutes(&self.exercises);
    }

    /// A plan needs a name and at least one exercise
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("routine name is required".into()));
        }
        let errors = validate_exercises(&self.name, &self.exercises);
        if !errors.is_empty() {
            return Err(Error::Validation(errors.join("; ")));
        }
        Ok(())
    }
}

/// Validate and store a new plan
pub fn save_plan<S: RecordStore>(store: &mut S, mut plan: WorkoutPlan) -> Result<Stored<WorkoutPlan>> {
    plan.refresh_duration();
    plan.validate()?;
    let stored = store.create(plan)?;
    tracing::info!(
        "Saved routine {:?} ({} exercises, ~{} min)",
        stored.record.name,
        stored.record.exercises.len(),
        stored.record.duration_minutes
    );
    Ok(stored)
}

/// Replace the editable fields of an existing plan
pub fn update_plan<S: RecordStore>(store: &mut S, id: &str, mut plan: WorkoutPlan) -> Result<Stored<WorkoutPlan>> {
    plan.refresh_duration();
    plan.validate()?;
    store.update(
        id,
        json!({
            "name": plan.name,
            "description": plan.description,
            "workout_type": plan.workout_type,
            "difficulty": plan.difficulty,
            "duration_minutes": plan.duration_minutes,
            "exercises": plan.exercises,
        }),
    )
}

/// A user's plans, newest first
pub fn plans_for_user<S: RecordStore>(store: &S, user_email: &str) -> Result<Vec<Stored<WorkoutPlan>>> {
    store.filter(
        &Filter::new().eq("user_email", user_email),
        Some(&SortKey::parse("-created_date")),
    )
}

/// Delete one of the user's plans. Plans owned by someone else are reported
/// as not found.
pub fn delete_plan<S: RecordStore>(store: &mut S, user_email: &str, id: &str) -> Result<()> {
    let plan: Stored<WorkoutPlan> = store.get(id)?;
    if plan.record.user_email != user_email {
        return Err(Error::NotFound {
            kind: crate::store::EntityKind::WorkoutPlan,
            id: id.to_string(),
        });
    }
    store.delete::<WorkoutPlan>(id)?;
    tracing::info!("Deleted routine {:?}", plan.record.name);
    Ok(())
}
