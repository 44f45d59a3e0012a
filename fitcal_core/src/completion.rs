//! Persisting a finished session and crediting the user's profile.
//!
//! Two writes happen in order: the session record, then the profile. The
//! profile write is conditional on the version that was read, so two
//! completions racing for the same profile cannot silently lose one
//! increment; the loser gets `VersionConflict` wrapped in
//! `ProfileNotCredited`. Nothing is retried here.

use crate::badges::credit_completed_session;
use crate::store::{Filter, RecordStore, Stored};
use crate::{
    Badge, CompletedExercise, Error, Result, SessionSummary, UserIdentity, UserProfile,
    WorkoutSessionRecord,
};
use serde_json::json;

/// What a successful completion wrote
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionOutcome {
    pub session: Stored<WorkoutSessionRecord>,
    pub profile: Stored<UserProfile>,
    pub newly_awarded: Vec<Badge>,
}

/// Find the user's profile
pub fn find_profile<S: RecordStore>(store: &S, user_email: &str) -> Result<Option<Stored<UserProfile>>> {
    let mut profiles: Vec<Stored<UserProfile>> =
        store.filter(&Filter::new().eq("user_email", user_email), None)?;
    if profiles.len() > 1 {
        tracing::warn!(
            "Found {} profiles for {}, using the first",
            profiles.len(),
            user_email
        );
    }
    Ok(if profiles.is_empty() {
        None
    } else {
        Some(profiles.swap_remove(0))
    })
}

/// Find the user's profile, creating an empty one when there is none
///
/// The lookup and the create happen as one store operation, so two first
/// completions racing for the same user still end up with one profile.
pub fn load_or_create_profile<S: RecordStore>(store: &mut S, user_email: &str) -> Result<Stored<UserProfile>> {
    store.find_or_create(
        &Filter::new().eq("user_email", user_email),
        UserProfile::new(user_email),
    )
}

/// Persist a finished session and credit it to the user's profile.
///
/// If the session record cannot be created the error is returned as is and
/// nothing else is written. If the session is saved but the profile step
/// fails, the error is `ProfileNotCredited` and the session stays saved.
pub fn complete_session<S: RecordStore>(
    store: &mut S,
    user: &UserIdentity,
    summary: &SessionSummary,
    exercises: &[CompletedExercise],
) -> Result<CompletionOutcome> {
    let session = store.create(WorkoutSessionRecord {
        user_email: user.email.clone(),
        summary: summary.clone(),
        exercises_completed: exercises.to_vec(),
    })?;
    tracing::info!(
        "Saved session {} for {:?} ({} min)",
        session.id,
        summary.workout_name,
        summary.duration_minutes
    );

    let (profile, newly_awarded) =
        credit_profile(store, &user.email).map_err(|source| Error::ProfileNotCredited {
            session_id: session.id.clone(),
            source: Box::new(source),
        })?;

    Ok(CompletionOutcome {
        session,
        profile,
        newly_awarded,
    })
}

fn credit_profile<S: RecordStore>(store: &mut S, user_email: &str) -> Result<(Stored<UserProfile>, Vec<Badge>)> {
    let current = load_or_create_profile(store, user_email)?;
    let credit = credit_completed_session(&current.record);

    let updated = store.update_versioned(
        &current.id,
        json!({
            "total_workouts": credit.total_workouts,
            "badges_earned": credit.badges_earned,
        }),
        Some(current.version),
    )?;

    Ok((updated, credit.newly_awarded))
}
