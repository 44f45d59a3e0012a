//! Badge awards on session completion.
//!
//! Each badge has an entry in [`BADGE_RULES`]. Only badges with a predicate
//! can be awarded; the rest are part of the vocabulary but have no trigger
//! yet. Badges are never removed from a profile.

use crate::{Badge, UserProfile};
use std::collections::BTreeSet;

/// Facts about the user available when a session completes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BadgeSignals {
    /// Completed workouts including the one being credited
    pub new_total: u32,
}

/// A badge and the condition that awards it
#[derive(Clone, Copy)]
pub struct BadgeRule {
    pub badge: Badge,
    pub predicate: Option<fn(&BadgeSignals) -> bool>,
}

pub const BADGE_RULES: &[BadgeRule] = &[
    BadgeRule {
        badge: Badge::FirstWorkout,
        predicate: Some(is_first_workout),
    },
    BadgeRule {
        badge: Badge::WeekWarrior,
        predicate: None,
    },
    BadgeRule {
        badge: Badge::StreakMaster,
        predicate: None,
    },
    BadgeRule {
        badge: Badge::ConsistencyKing,
        predicate: None,
    },
    BadgeRule {
        badge: Badge::MilestoneAchiever,
        predicate: Some(is_milestone),
    },
    BadgeRule {
        badge: Badge::ElitePerformer,
        predicate: None,
    },
];

/// Total at which the milestone badge is awarded
pub const MILESTONE_WORKOUTS: u32 = 50;

fn is_first_workout(signals: &BadgeSignals) -> bool {
    signals.new_total == 1
}

fn is_milestone(signals: &BadgeSignals) -> bool {
    signals.new_total == MILESTONE_WORKOUTS
}

/// The profile fields to write back after a completed session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileCredit {
    pub total_workouts: u32,
    pub badges_earned: BTreeSet<Badge>,
    /// Badges this session added, in display order
    pub newly_awarded: Vec<Badge>,
}

/// Credit one completed session to `profile`
pub fn credit_completed_session(profile: &UserProfile) -> ProfileCredit {
    let signals = BadgeSignals {
        new_total: profile.total_workouts.saturating_add(1),
    };

    let mut badges_earned = profile.badges_earned.clone();
    let mut newly_awarded = Vec::new();

    for rule in BADGE_RULES {
        let Some(predicate) = rule.predicate else {
            continue;
        };
        if predicate(&signals) && badges_earned.insert(rule.badge) {
            tracing::info!("Awarded badge {} to {}", rule.badge, profile.user_email);
            newly_awarded.push(rule.badge);
        }
    }

    ProfileCredit {
        total_workouts: signals.new_total,
        badges_earned,
        newly_awarded,
    }
}
