//! Default workout library and exercise list.
//!
//! This module provides the built-in workouts and the common exercises
//! offered when building a routine, plus lookups against the store.

use crate::store::{Filter, RecordStore, Stored};
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(name: &str, sets: Option<u32>, reps: Option<u32>, duration: Option<u32>, rest: Option<u32>) -> Exercise {
    Exercise {
        name: name.into(),
        sets,
        reps,
        duration_seconds: duration,
        rest_seconds: rest,
        instructions: None,
    }
}

fn template(name: &str, category: ExerciseCategory, muscle_group: &str) -> ExerciseTemplate {
    ExerciseTemplate {
        name: name.into(),
        category,
        muscle_group: muscle_group.into(),
    }
}

/// Builds the default catalog with built-in workouts and exercises
pub fn build_default_catalog() -> Catalog {
    let workouts = vec![
        Workout {
            name: "Leg Day".into(),
            description: "Lower body strength built around squats and hinges".into(),
            workout_type: WorkoutType::Strength,
            difficulty: Difficulty::Intermediate,
            duration_minutes: 45,
            exercises: vec![
                Exercise {
                    instructions: Some("Feet shoulder-width apart, sit back and keep the chest up".into()),
                    ..exercise("Squats", Some(4), Some(10), None, Some(90))
                },
                exercise("Lunges", Some(3), Some(12), None, Some(60)),
                exercise("Deadlifts", Some(4), Some(8), None, Some(120)),
                exercise("Jump Squats", Some(3), Some(15), None, Some(60)),
            ],
        },
        Workout {
            name: "Upper Body Strength".into(),
            description: "Push and pull for chest, back and arms".into(),
            workout_type: WorkoutType::Strength,
            difficulty: Difficulty::Intermediate,
            duration_minutes: 40,
            exercises: vec![
                exercise("Push-ups", Some(3), Some(15), None, Some(60)),
                exercise("Pull-ups", Some(3), Some(8), None, Some(90)),
                exercise("Dumbbell Rows", Some(3), Some(12), None, Some(60)),
                exercise("Bicep Curls", Some(3), Some(12), None, Some(45)),
                exercise("Tricep Dips", Some(3), Some(12), None, Some(45)),
            ],
        },
        Workout {
            name: "Core Blast".into(),
            description: "Short core circuit, no equipment".into(),
            workout_type: WorkoutType::Core,
            difficulty: Difficulty::Beginner,
            duration_minutes: 15,
            exercises: vec![
                exercise("Plank", None, None, Some(60), Some(30)),
                exercise("Russian Twists", Some(3), Some(20), None, Some(30)),
                exercise("Leg Raises", Some(3), Some(12), None, Some(30)),
                exercise("Side Plank", Some(2), None, Some(30), Some(30)),
            ],
        },
        Workout {
            name: "HIIT Express".into(),
            description: "Twenty minutes of intervals to get the heart rate up".into(),
            workout_type: WorkoutType::Hiit,
            difficulty: Difficulty::Advanced,
            duration_minutes: 20,
            exercises: vec![
                exercise("Burpees", Some(4), Some(10), None, Some(20)),
                exercise("Mountain Climbers", Some(4), None, Some(40), Some(20)),
                exercise("Jump Squats", Some(4), Some(12), None, Some(20)),
                exercise("High Knees", Some(4), None, Some(30), Some(20)),
            ],
        },
        Workout {
            name: "Cardio Kickstart".into(),
            description: "Low-skill cardio for beginners".into(),
            workout_type: WorkoutType::Cardio,
            difficulty: Difficulty::Beginner,
            duration_minutes: 25,
            exercises: vec![
                exercise("Jumping Jacks", Some(3), None, Some(60), Some(30)),
                exercise("High Knees", Some(3), None, Some(30), Some(30)),
                exercise("Box Jumps", Some(3), Some(8), None, Some(60)),
            ],
        },
        Workout {
            name: "Morning Flow".into(),
            description: "Gentle yoga sequence to start the day".into(),
            workout_type: WorkoutType::Yoga,
            difficulty: Difficulty::Beginner,
            duration_minutes: 20,
            exercises: vec![
                exercise("Sun Salutation", None, None, Some(300), None),
                exercise("Warrior Sequence", None, None, Some(420), None),
                exercise("Seated Forward Fold", None, None, Some(180), None),
            ],
        },
    ];

    let exercises = vec![
        template("Push-ups", ExerciseCategory::Strength, "chest"),
        template("Squats", ExerciseCategory::Strength, "legs"),
        template("Lunges", ExerciseCategory::Strength, "legs"),
        template("Plank", ExerciseCategory::Core, "core"),
        template("Burpees", ExerciseCategory::Cardio, "full_body"),
        template("Mountain Climbers", ExerciseCategory::Cardio, "core"),
        template("Pull-ups", ExerciseCategory::Strength, "back"),
        template("Dumbbell Rows", ExerciseCategory::Strength, "back"),
        template("Bench Press", ExerciseCategory::Strength, "chest"),
        template("Deadlifts", ExerciseCategory::Strength, "legs"),
        template("Bicep Curls", ExerciseCategory::Strength, "arms"),
        template("Tricep Dips", ExerciseCategory::Strength, "arms"),
        template("Jumping Jacks", ExerciseCategory::Cardio, "full_body"),
        template("High Knees", ExerciseCategory::Cardio, "legs"),
        template("Sit-ups", ExerciseCategory::Core, "core"),
        template("Russian Twists", ExerciseCategory::Core, "core"),
        template("Leg Raises", ExerciseCategory::Core, "core"),
        template("Side Plank", ExerciseCategory::Core, "core"),
        template("Jump Squats", ExerciseCategory::Cardio, "legs"),
        template("Box Jumps", ExerciseCategory::Cardio, "legs"),
    ];

    Catalog { workouts, exercises }
}

impl Catalog {
    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for workout in &self.workouts {
            if workout.name.trim().is_empty() {
                errors.push("Workout has empty name".to_string());
            }
            if !seen.insert(workout.name.to_lowercase()) {
                errors.push(format!("Duplicate workout name '{}'", workout.name));
            }
            errors.extend(validate_exercises(&workout.name, &workout.exercises));
        }

        let mut seen = HashSet::new();
        for template in &self.exercises {
            if !seen.insert(template.name.to_lowercase()) {
                errors.push(format!("Duplicate exercise '{}'", template.name));
            }
        }

        errors
    }

    /// Picker entries whose name contains `query`, optionally limited to a category
    pub fn search_exercises(&self, query: &str, category: Option<ExerciseCategory>) -> Vec<&ExerciseTemplate> {
        let query = query.to_lowercase();
        self.exercises
            .iter()
            .filter(|t| t.name.to_lowercase().contains(&query))
            .filter(|t| category.map_or(true, |c| t.category == c))
            .collect()
    }
}

/// Problems with an exercise list, prefixed with `owner`
pub fn validate_exercises(owner: &str, exercises: &[Exercise]) -> Vec<String> {
    let mut errors = Vec::new();
    if exercises.is_empty() {
        errors.push(format!("'{}' has no exercises", owner));
    }
    for (i, exercise) in exercises.iter().enumerate() {
        if exercise.name.trim().is_empty() {
            errors.push(format!("'{}': exercise {} has empty name", owner, i + 1));
        }
        if exercise.sets == Some(0) {
            errors.push(format!("'{}': exercise '{}' has zero sets", owner, exercise.name));
        }
    }
    errors
}

/// Library workouts matching a free-text query and optional filters.
/// The query matches name or description, ignoring case.
pub fn search_library<'a>(
    workouts: &'a [Stored<Workout>],
    query: &str,
    workout_type: Option<WorkoutType>,
    difficulty: Option<Difficulty>,
) -> Vec<&'a Stored<Workout>> {
    let query = query.to_lowercase();
    workouts
        .iter()
        .filter(|w| {
            w.record.name.to_lowercase().contains(&query)
                || w.record.description.to_lowercase().contains(&query)
        })
        .filter(|w| workout_type.map_or(true, |t| w.record.workout_type == t))
        .filter(|w| difficulty.map_or(true, |d| w.record.difficulty == d))
        .collect()
}

/// Store the built-in workouts when the library is empty.
///
/// Returns how many workouts were added.
pub fn seed_library<S: RecordStore>(store: &mut S) -> Result<usize> {
    if !store.list::<Workout>()?.is_empty() {
        return Ok(0);
    }

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        return Err(Error::Catalog(errors.join("; ")));
    }

    let created = store.bulk_create(catalog.workouts.clone())?;
    tracing::info!("Seeded workout library with {} workouts", created.len());
    Ok(created.len())
}

/// Resolve a library workout or one of the user's plans by id or name
pub fn resolve_definition<S: RecordStore>(
    store: &S,
    key: &str,
    source: SourceKind,
    user_email: &str,
) -> Result<WorkoutDefinition> {
    match source {
        SourceKind::Library => {
            let workouts: Vec<Stored<Workout>> = store.list()?;
            find_by_key(workouts, key, |w| &w.record.name).map(WorkoutDefinition::from)
        }
        SourceKind::CustomPlan => {
            let plans: Vec<Stored<WorkoutPlan>> =
                store.filter(&Filter::new().eq("user_email", user_email), None)?;
            find_by_key(plans, key, |p| &p.record.name).map(WorkoutDefinition::from)
        }
    }
}

/// Exact id match first, then case-insensitive name match
fn find_by_key<T, F>(mut items: Vec<Stored<T>>, key: &str, name: F) -> Result<Stored<T>>
where
    F: Fn(&Stored<T>) -> &String,
{
    let lowered = key.to_lowercase();
    let pos = items
        .iter()
        .position(|item| item.id == key)
        .or_else(|| items.iter().position(|item| name(item).to_lowercase() == lowered));

    match pos {
        Some(pos) => Ok(items.swap_remove(pos)),
        None => Err(Error::Validation(format!("no workout matches {:?}", key))),
    }
}
