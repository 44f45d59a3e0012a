//! Core domain types for the fitcal system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workouts, custom plans and their exercises
//! - Scheduling requests, recurrence rules and scheduled records
//! - Session summaries and persisted session records
//! - User profiles, badges and identities

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::store::{Record, Stored};

// ============================================================================
// Workout Types
// ============================================================================

/// Kind of workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Strength,
    Cardio,
    Yoga,
    Hiit,
    Flexibility,
    Core,
    Custom,
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkoutType::Strength => "strength",
            WorkoutType::Cardio => "cardio",
            WorkoutType::Yoga => "yoga",
            WorkoutType::Hiit => "hiit",
            WorkoutType::Flexibility => "flexibility",
            WorkoutType::Core => "core",
            WorkoutType::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl FromStr for WorkoutType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strength" => Ok(WorkoutType::Strength),
            "cardio" => Ok(WorkoutType::Cardio),
            "yoga" => Ok(WorkoutType::Yoga),
            "hiit" => Ok(WorkoutType::Hiit),
            "flexibility" => Ok(WorkoutType::Flexibility),
            "core" => Ok(WorkoutType::Core),
            "custom" => Ok(WorkoutType::Custom),
            other => Err(crate::Error::Validation(format!(
                "unknown workout type: {}",
                other
            ))),
        }
    }
}

/// Workout difficulty, also used as the user's fitness level
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        };
        f.write_str(name)
    }
}

impl FromStr for Difficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(crate::Error::Validation(format!(
                "unknown difficulty: {}",
                other
            ))),
        }
    }
}

/// A single exercise within a workout or plan.
///
/// Every prescription field is optional: a plank only has a duration,
/// a set of squats only has sets and reps.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Exercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A workout from the shared library
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub workout_type: WorkoutType,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub exercises: Vec<Exercise>,
}

/// A user-built routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutPlan {
    pub user_email: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub workout_type: WorkoutType,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub exercises: Vec<Exercise>,
}

/// Read-only input to a session, built from either a library workout or a plan
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutDefinition {
    pub id: String,
    pub name: String,
    pub workout_type: WorkoutType,
    pub difficulty: Difficulty,
    pub duration_minutes: u32,
    pub exercises: Vec<Exercise>,
}

impl From<Stored<Workout>> for WorkoutDefinition {
    fn from(stored: Stored<Workout>) -> Self {
        WorkoutDefinition {
            id: stored.id,
            name: stored.record.name,
            workout_type: stored.record.workout_type,
            difficulty: stored.record.difficulty,
            duration_minutes: stored.record.duration_minutes,
            exercises: stored.record.exercises,
        }
    }
}

impl From<Stored<WorkoutPlan>> for WorkoutDefinition {
    fn from(stored: Stored<WorkoutPlan>) -> Self {
        WorkoutDefinition {
            id: stored.id,
            name: stored.record.name,
            workout_type: stored.record.workout_type,
            difficulty: stored.record.difficulty,
            duration_minutes: stored.record.duration_minutes,
            exercises: stored.record.exercises,
        }
    }
}

// ============================================================================
// Scheduling Types
// ============================================================================

/// Where a scheduled workout comes from
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Library,
    CustomPlan,
}

/// Day of the week, serialized as its lower-case English name
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = crate::Error;

    /// Accepts full names and three-letter abbreviations, any case
    fn from_str(s: &str) -> crate::Result<Self> {
        let lowered = s.trim().to_lowercase();
        DayOfWeek::ALL
            .iter()
            .copied()
            .find(|d| d.name() == lowered || (lowered.len() == 3 && d.name().starts_with(&lowered)))
            .ok_or_else(|| crate::Error::Validation(format!("unknown day of week: {}", s)))
    }
}

/// How a schedule repeats.
///
/// `days_of_week` only exists on the weekly variant, so it cannot leak into
/// the other patterns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum RecurrenceRule {
    #[default]
    None,
    Daily {
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
    Weekly {
        days_of_week: BTreeSet<DayOfWeek>,
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
    Monthly {
        #[serde(default)]
        end_date: Option<NaiveDate>,
    },
}

impl RecurrenceRule {
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            RecurrenceRule::None => None,
            RecurrenceRule::Daily { end_date }
            | RecurrenceRule::Weekly { end_date, .. }
            | RecurrenceRule::Monthly { end_date } => *end_date,
        }
    }

    pub fn pattern_name(&self) -> &'static str {
        match self {
            RecurrenceRule::None => "none",
            RecurrenceRule::Daily { .. } => "daily",
            RecurrenceRule::Weekly { .. } => "weekly",
            RecurrenceRule::Monthly { .. } => "monthly",
        }
    }
}

/// Reference to the workout being scheduled
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkoutRef {
    pub workout_id: String,
    pub workout_name: String,
    pub workout_type: WorkoutType,
    pub duration_minutes: u32,
}

/// Transient input to schedule expansion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleRequest {
    pub user_email: String,
    pub workout: WorkoutRef,
    pub source: SourceKind,
    pub start_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub notes: Option<String>,
    pub reminder_enabled: bool,
    pub recurrence: RecurrenceRule,
}

/// Lifecycle of a scheduled entry
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    Completed,
    Skipped,
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Skipped => "skipped",
        };
        f.write_str(name)
    }
}

impl FromStr for ScheduleStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(ScheduleStatus::Scheduled),
            "completed" | "done" => Ok(ScheduleStatus::Completed),
            "skipped" | "skip" => Ok(ScheduleStatus::Skipped),
            other => Err(crate::Error::Validation(format!(
                "unknown schedule status: {}",
                other
            ))),
        }
    }
}

/// One dated calendar entry produced by expansion
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledWorkoutRecord {
    pub user_email: String,
    #[serde(flatten)]
    pub workout: WorkoutRef,
    pub source_type: SourceKind,
    pub scheduled_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub scheduled_time: NaiveTime,
    #[serde(default)]
    pub notes: Option<String>,
    pub reminder_enabled: bool,
    pub status: ScheduleStatus,
}

// ============================================================================
// Session Types
// ============================================================================

/// One completed exercise within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletedExercise {
    pub name: String,
    pub sets_completed: u32,
    pub reps_completed: u32,
}

/// Produced by the session engine when a session ends
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub workout_id: String,
    pub workout_name: String,
    pub duration_minutes: u32,
    pub completed_date: DateTime<Utc>,
    pub calories_burned: u32,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub rating: u8,
}

/// A persisted workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSessionRecord {
    pub user_email: String,
    #[serde(flatten)]
    pub summary: SessionSummary,
    #[serde(default)]
    pub exercises_completed: Vec<CompletedExercise>,
}

// ============================================================================
// Profile and Identity Types
// ============================================================================

/// Achievement identifiers. Declaration order is display order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstWorkout,
    WeekWarrior,
    StreakMaster,
    ConsistencyKing,
    MilestoneAchiever,
    ElitePerformer,
}

impl Badge {
    pub const ALL: [Badge; 6] = [
        Badge::FirstWorkout,
        Badge::WeekWarrior,
        Badge::StreakMaster,
        Badge::ConsistencyKing,
        Badge::MilestoneAchiever,
        Badge::ElitePerformer,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Badge::FirstWorkout => "first_workout",
            Badge::WeekWarrior => "week_warrior",
            Badge::StreakMaster => "streak_master",
            Badge::ConsistencyKing => "consistency_king",
            Badge::MilestoneAchiever => "milestone_achiever",
            Badge::ElitePerformer => "elite_performer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Badge::FirstWorkout => "Completed your first workout",
            Badge::WeekWarrior => "Completed 7 workouts in a week",
            Badge::StreakMaster => "Maintained a 7-day streak",
            Badge::ConsistencyKing => "Worked out 4 weeks in a row",
            Badge::MilestoneAchiever => "Completed 50 workouts",
            Badge::ElitePerformer => "Reached advanced fitness level",
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A user's aggregate fitness profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserProfile {
    pub user_email: String,
    #[serde(default)]
    pub total_workouts: u32,
    #[serde(default)]
    pub badges_earned: BTreeSet<Badge>,
    #[serde(default)]
    pub fitness_level: Option<Difficulty>,
    #[serde(default)]
    pub weekly_target: Option<u32>,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl UserProfile {
    pub fn new(user_email: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            ..Self::default()
        }
    }
}

/// The signed-in user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
    pub display_name: String,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Category used by the exercise picker
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Core,
}

impl fmt::Display for ExerciseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::Cardio => "cardio",
            ExerciseCategory::Core => "core",
        };
        f.pad(name)
    }
}

/// A common exercise offered when building a routine
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExerciseTemplate {
    pub name: String,
    pub category: ExerciseCategory,
    pub muscle_group: String,
}

/// The built-in workout library and exercise picker list
#[derive(Clone, Debug)]
pub struct Catalog {
    pub workouts: Vec<Workout>,
    pub exercises: Vec<ExerciseTemplate>,
}

// ============================================================================
// Record kinds
// ============================================================================

impl Record for Workout {
    const KIND: crate::store::EntityKind = crate::store::EntityKind::Workout;
}

impl Record for WorkoutPlan {
    const KIND: crate::store::EntityKind = crate::store::EntityKind::WorkoutPlan;
}

impl Record for ScheduledWorkoutRecord {
    const KIND: crate::store::EntityKind = crate::store::EntityKind::ScheduledWorkout;
}

impl Record for WorkoutSessionRecord {
    const KIND: crate::store::EntityKind = crate::store::EntityKind::WorkoutSession;
}

impl Record for UserProfile {
    const KIND: crate::store::EntityKind = crate::store::EntityKind::UserProfile;
}

/// Serde adapter storing a time of day as "HH:MM"
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Parse "HH:MM", tolerating a trailing ":SS"
    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(s, FORMAT).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_week_parsing() {
        assert_eq!("Monday".parse::<DayOfWeek>().unwrap(), DayOfWeek::Monday);
        assert_eq!("wed".parse::<DayOfWeek>().unwrap(), DayOfWeek::Wednesday);
        assert!("funday".parse::<DayOfWeek>().is_err());
        assert!("w".parse::<DayOfWeek>().is_err());
    }

    #[test]
    fn test_recurrence_rule_serde_shape() {
        let rule = RecurrenceRule::Weekly {
            days_of_week: [DayOfWeek::Monday, DayOfWeek::Friday].into_iter().collect(),
            end_date: None,
        };
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["pattern"], "weekly");
        assert_eq!(json["days_of_week"], serde_json::json!(["monday", "friday"]));

        let daily: RecurrenceRule =
            serde_json::from_str(r#"{"pattern":"daily","end_date":"2024-03-10"}"#).unwrap();
        assert_eq!(daily.end_date(), NaiveDate::from_ymd_opt(2024, 3, 10));
        assert_eq!(daily.pattern_name(), "daily");
    }

    #[test]
    fn test_scheduled_time_serializes_as_hhmm() {
        let record = ScheduledWorkoutRecord {
            user_email: "a@b.c".into(),
            workout: WorkoutRef {
                workout_id: "w1".into(),
                workout_name: "Leg Day".into(),
                workout_type: WorkoutType::Strength,
                duration_minutes: 45,
            },
            source_type: SourceKind::Library,
            scheduled_date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            notes: None,
            reminder_enabled: true,
            status: ScheduleStatus::Scheduled,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["scheduled_time"], "07:30");
        assert_eq!(json["scheduled_date"], "2024-03-04");
        assert_eq!(json["workout_name"], "Leg Day");
        assert_eq!(json["status"], "scheduled");

        let back: ScheduledWorkoutRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_profile_defaults_for_missing_fields() {
        let profile: UserProfile = serde_json::from_str(r#"{"user_email":"a@b.c"}"#).unwrap();
        assert_eq!(profile.total_workouts, 0);
        assert!(profile.badges_earned.is_empty());
        assert!(profile.goals.is_empty());
    }
}
