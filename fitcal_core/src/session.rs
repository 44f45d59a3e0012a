//! Live workout session state machine.
//!
//! A session moves `NotStarted -> Running <-> Paused -> Ended`. `Ended` is
//! terminal. Every rejected transition leaves the state exactly as it was.
//!
//! The engine owns no clock. Its owner drives the one-second timer by
//! calling [`SessionEngine::tick`] with the [`TimerToken`] handed out when
//! the timer was (re)started. Pausing or ending invalidates outstanding
//! tokens, so a tick that was already scheduled when the timer stopped is
//! ignored instead of counted.

use crate::{CompletedExercise, Error, Exercise, Result, SessionSummary, WorkoutDefinition};
use chrono::{DateTime, Utc};
use std::fmt;

/// Highest accepted session rating
pub const MAX_RATING: u8 = 5;

/// Lifecycle phase of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Running,
    Paused,
    Ended,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Running => "running",
            SessionPhase::Paused => "paused",
            SessionPhase::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Proof that the timer was running when a tick was scheduled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerToken {
    generation: u64,
}

/// Controller for one active workout session
#[derive(Clone, Debug)]
pub struct SessionEngine {
    workout: WorkoutDefinition,
    phase: SessionPhase,
    current_exercise_index: usize,
    elapsed_seconds: u64,
    completed_exercises: Vec<CompletedExercise>,
    timer_generation: u64,
    notes: String,
    rating: u8,
    summary: Option<SessionSummary>,
}

impl SessionEngine {
    pub fn new(workout: WorkoutDefinition) -> Self {
        Self {
            workout,
            phase: SessionPhase::NotStarted,
            current_exercise_index: 0,
            elapsed_seconds: 0,
            completed_exercises: Vec::new(),
            timer_generation: 0,
            notes: String::new(),
            rating: 0,
            summary: None,
        }
    }

    pub fn workout(&self) -> &WorkoutDefinition {
        &self.workout
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    pub fn is_ended(&self) -> bool {
        self.phase == SessionPhase::Ended
    }

    pub fn current_exercise_index(&self) -> usize {
        self.current_exercise_index
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.workout.exercises.get(self.current_exercise_index)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn completed_exercises(&self) -> &[CompletedExercise] {
        &self.completed_exercises
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Summary produced by [`end`](Self::end), kept so persistence can be retried
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Elapsed time against the workout's estimate, capped at 100.
    /// Workouts without an estimate are measured against 10 minutes.
    pub fn progress_percent(&self) -> u8 {
        let target_minutes = if self.workout.duration_minutes == 0 {
            10
        } else {
            self.workout.duration_minutes as u64
        };
        let percent = self.elapsed_seconds * 100 / (target_minutes * 60);
        percent.min(100) as u8
    }

    /// Begin the session and its timer
    pub fn start(&mut self) -> Result<TimerToken> {
        self.require(&[SessionPhase::NotStarted], "start")?;

        self.phase = SessionPhase::Running;
        self.elapsed_seconds = 0;
        self.current_exercise_index = 0;

        tracing::info!("Started session for workout {:?}", self.workout.name);
        Ok(self.next_token())
    }

    /// Pause a running session or resume a paused one.
    ///
    /// Returns the new timer token when the session resumes.
    pub fn toggle_running(&mut self) -> Result<Option<TimerToken>> {
        match self.phase {
            SessionPhase::Running => {
                self.phase = SessionPhase::Paused;
                self.cancel_timer();
                tracing::debug!("Paused session at {}s", self.elapsed_seconds);
                Ok(None)
            }
            SessionPhase::Paused => {
                self.phase = SessionPhase::Running;
                tracing::debug!("Resumed session at {}s", self.elapsed_seconds);
                Ok(Some(self.next_token()))
            }
            phase => Err(Error::InvalidTransition {
                action: "pause or resume",
                phase,
            }),
        }
    }

    /// Count one elapsed second.
    ///
    /// Returns whether the tick was counted. Ticks are dropped unless the
    /// session is running and `token` belongs to the current run of the timer.
    pub fn tick(&mut self, token: TimerToken) -> bool {
        if self.phase != SessionPhase::Running || token.generation != self.timer_generation {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Record the current exercise as done and move to the next one.
    ///
    /// The pointer never moves past the last exercise; completing the last
    /// exercise again records another entry and leaves the pointer in place.
    pub fn complete_current_exercise(&mut self) -> Result<&CompletedExercise> {
        self.require(
            &[SessionPhase::Running, SessionPhase::Paused],
            "complete an exercise in",
        )?;

        let exercise = self
            .current_exercise()
            .ok_or_else(|| Error::Validation(format!("workout {:?} has no exercises", self.workout.name)))?;

        let entry = CompletedExercise {
            name: exercise.name.clone(),
            sets_completed: exercise.sets.unwrap_or(1),
            reps_completed: exercise.reps.unwrap_or(0),
        };
        tracing::debug!(
            "Completed exercise {} ({}/{})",
            entry.name,
            self.current_exercise_index + 1,
            self.workout.exercises.len()
        );
        self.completed_exercises.push(entry);

        if self.current_exercise_index + 1 < self.workout.exercises.len() {
            self.current_exercise_index += 1;
        }

        Ok(&self.completed_exercises[self.completed_exercises.len() - 1])
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<()> {
        self.require_not_ended("annotate")?;
        self.notes = notes.into();
        Ok(())
    }

    /// Rate the session from 0 (unrated) to [`MAX_RATING`]
    pub fn set_rating(&mut self, rating: u8) -> Result<()> {
        self.require_not_ended("rate")?;
        if rating > MAX_RATING {
            return Err(Error::Validation(format!(
                "rating must be between 0 and {}, got {}",
                MAX_RATING, rating
            )));
        }
        self.rating = rating;
        Ok(())
    }

    /// End the session now
    pub fn end(&mut self) -> Result<SessionSummary> {
        self.end_at(Utc::now())
    }

    /// End the session, stamping the summary with `completed_date`.
    ///
    /// Not idempotent: a second call is rejected because the session is
    /// already ended. Use [`summary`](Self::summary) to retry persistence.
    pub fn end_at(&mut self, completed_date: DateTime<Utc>) -> Result<SessionSummary> {
        self.require(&[SessionPhase::Running, SessionPhase::Paused], "end")?;

        self.phase = SessionPhase::Ended;
        self.cancel_timer();

        let summary = SessionSummary {
            workout_id: self.workout.id.clone(),
            workout_name: self.workout.name.clone(),
            duration_minutes: ((self.elapsed_seconds + 30) / 60) as u32,
            completed_date,
            calories_burned: 0,
            notes: self.notes.clone(),
            rating: self.rating,
        };

        tracing::info!(
            "Ended session for workout {:?} after {}s ({} exercise(s) completed)",
            self.workout.name,
            self.elapsed_seconds,
            self.completed_exercises.len()
        );

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    fn require(&self, allowed: &[SessionPhase], action: &'static str) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            tracing::warn!("Rejected attempt to {} a session that is {}", action, self.phase);
            Err(Error::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }

    fn require_not_ended(&self, action: &'static str) -> Result<()> {
        self.require(
            &[SessionPhase::NotStarted, SessionPhase::Running, SessionPhase::Paused],
            action,
        )
    }

    fn next_token(&self) -> TimerToken {
        TimerToken {
            generation: self.timer_generation,
        }
    }

    fn cancel_timer(&mut self) {
        self.timer_generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Difficulty, WorkoutType};

    fn exercise(name: &str, sets: Option<u32>, reps: Option<u32>, duration: Option<u32>) -> Exercise {
        Exercise {
            name: name.into(),
            sets,
            reps,
            duration_seconds: duration,
            ..Exercise::default()
        }
    }

    fn three_exercise_workout() -> WorkoutDefinition {
        WorkoutDefinition {
            id: "w-1".into(),
            name: "Full Body".into(),
            workout_type: WorkoutType::Strength,
            difficulty: Difficulty::Beginner,
            duration_minutes: 20,
            exercises: vec![
                exercise("Squats", Some(3), Some(12), None),
                exercise("Push-ups", Some(3), Some(10), None),
                exercise("Plank", None, None, Some(60)),
            ],
        }
    }

    fn ticks(engine: &mut SessionEngine, token: TimerToken, n: u64) {
        for _ in 0..n {
            engine.tick(token);
        }
    }

    #[test]
    fn test_start_resets_counters() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        assert_eq!(engine.phase(), SessionPhase::NotStarted);

        engine.start().unwrap();
        assert_eq!(engine.current_exercise_index(), 0);
        assert_eq!(engine.elapsed_seconds(), 0);
        assert!(engine.is_running());
    }

    #[test]
    fn test_ticks_count_only_while_running() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        let token = engine.start().unwrap();

        ticks(&mut engine, token, 42);
        assert_eq!(engine.elapsed_seconds(), 42);

        assert_eq!(engine.toggle_running().unwrap(), None);
        assert_eq!(engine.phase(), SessionPhase::Paused);
        ticks(&mut engine, token, 10);
        assert_eq!(engine.elapsed_seconds(), 42);

        let resumed = engine.toggle_running().unwrap().unwrap();
        ticks(&mut engine, resumed, 8);
        assert_eq!(engine.elapsed_seconds(), 50);
        assert_eq!(engine.current_exercise_index(), 0);
    }

    #[test]
    fn test_stale_token_is_ignored_after_resume() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        let first = engine.start().unwrap();
        engine.toggle_running().unwrap();
        let second = engine.toggle_running().unwrap().unwrap();

        assert!(!engine.tick(first));
        assert!(engine.tick(second));
        assert_eq!(engine.elapsed_seconds(), 1);
    }

    #[test]
    fn test_no_ticks_after_end() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        let token = engine.start().unwrap();
        ticks(&mut engine, token, 5);
        engine.end().unwrap();

        assert!(!engine.tick(token));
        assert_eq!(engine.elapsed_seconds(), 5);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_complete_exercise_advances_and_stops_at_last() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.start().unwrap();

        engine.complete_current_exercise().unwrap();
        assert_eq!(engine.current_exercise_index(), 1);
        engine.complete_current_exercise().unwrap();
        assert_eq!(engine.current_exercise_index(), 2);

        engine.complete_current_exercise().unwrap();
        assert_eq!(engine.current_exercise_index(), 2);
        engine.complete_current_exercise().unwrap();
        assert_eq!(engine.current_exercise_index(), 2);

        let names: Vec<&str> = engine
            .completed_exercises()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Squats", "Push-ups", "Plank", "Plank"]);
    }

    #[test]
    fn test_duration_only_exercise_defaults() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.start().unwrap();
        engine.complete_current_exercise().unwrap();
        engine.complete_current_exercise().unwrap();

        let plank = engine.complete_current_exercise().unwrap().clone();
        assert_eq!(
            plank,
            CompletedExercise {
                name: "Plank".into(),
                sets_completed: 1,
                reps_completed: 0,
            }
        );

        assert_eq!(engine.completed_exercises()[0].sets_completed, 3);
        assert_eq!(engine.completed_exercises()[0].reps_completed, 12);
    }

    #[test]
    fn test_complete_exercise_allowed_while_paused() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.start().unwrap();
        engine.toggle_running().unwrap();

        engine.complete_current_exercise().unwrap();
        assert_eq!(engine.current_exercise_index(), 1);
    }

    #[test]
    fn test_workout_without_exercises() {
        let mut workout = three_exercise_workout();
        workout.exercises.clear();
        let mut engine = SessionEngine::new(workout);
        engine.start().unwrap();

        assert!(matches!(
            engine.complete_current_exercise(),
            Err(Error::Validation(_))
        ));
        assert!(engine.completed_exercises().is_empty());
        assert_eq!(engine.current_exercise_index(), 0);
    }

    #[test]
    fn test_invalid_transitions_do_not_mutate() {
        let mut engine = SessionEngine::new(three_exercise_workout());

        assert!(matches!(
            engine.end(),
            Err(Error::InvalidTransition {
                phase: SessionPhase::NotStarted,
                ..
            })
        ));
        assert!(engine.toggle_running().is_err());
        assert!(engine.complete_current_exercise().is_err());
        assert_eq!(engine.phase(), SessionPhase::NotStarted);
        assert!(engine.summary().is_none());

        let token = engine.start().unwrap();
        ticks(&mut engine, token, 3);
        assert!(engine.start().is_err());
        assert_eq!(engine.elapsed_seconds(), 3);
        assert!(engine.is_running());
    }

    #[test]
    fn test_end_is_terminal() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.start().unwrap();
        engine.complete_current_exercise().unwrap();
        let summary = engine.end().unwrap();

        assert!(engine.is_ended());
        assert_eq!(engine.summary(), Some(&summary));

        assert!(engine.end().is_err());
        assert!(engine.toggle_running().is_err());
        assert!(engine.start().is_err());
        assert!(engine.complete_current_exercise().is_err());
        assert!(engine.set_rating(3).is_err());

        assert_eq!(engine.completed_exercises().len(), 1);
        assert_eq!(engine.summary(), Some(&summary));
    }

    #[test]
    fn test_end_from_paused() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.start().unwrap();
        engine.toggle_running().unwrap();

        assert!(engine.end().is_ok());
        assert_eq!(engine.phase(), SessionPhase::Ended);
    }

    #[test]
    fn test_summary_fields() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        engine.set_notes("felt strong").unwrap();
        engine.set_rating(4).unwrap();
        let token = engine.start().unwrap();
        ticks(&mut engine, token, 150);

        let now = Utc::now();
        let summary = engine.end_at(now).unwrap();

        assert_eq!(summary.workout_id, "w-1");
        assert_eq!(summary.workout_name, "Full Body");
        // 2.5 minutes rounds up
        assert_eq!(summary.duration_minutes, 3);
        assert_eq!(summary.completed_date, now);
        assert_eq!(summary.calories_burned, 0);
        assert_eq!(summary.notes, "felt strong");
        assert_eq!(summary.rating, 4);
    }

    #[test]
    fn test_duration_rounding() {
        for (seconds, minutes) in [(0u64, 0u32), (29, 0), (30, 1), (89, 1), (90, 2), (3600, 60)] {
            let mut engine = SessionEngine::new(three_exercise_workout());
            let token = engine.start().unwrap();
            ticks(&mut engine, token, seconds);
            assert_eq!(engine.end().unwrap().duration_minutes, minutes, "{}s", seconds);
        }
    }

    #[test]
    fn test_rating_bounds() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        assert!(engine.set_rating(MAX_RATING).is_ok());
        assert!(engine.set_rating(MAX_RATING + 1).is_err());
        assert_eq!(engine.rating(), MAX_RATING);
    }

    #[test]
    fn test_progress_percent() {
        let mut engine = SessionEngine::new(three_exercise_workout());
        let token = engine.start().unwrap();
        ticks(&mut engine, token, 600);
        assert_eq!(engine.progress_percent(), 50);
        ticks(&mut engine, token, 1200);
        assert_eq!(engine.progress_percent(), 100);
    }
}
