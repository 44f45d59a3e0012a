#![forbid(unsafe_code)]

//! Core domain model and business logic for Fitcal.
//!
//! This crate provides:
//! - Domain types (workouts, routines, schedules, sessions, profiles)
//! - Schedule expansion for one-off and repeating workouts
//! - The live workout session state machine
//! - Badge awarding and session completion
//! - Persistence (record store, JSON files, CSV export)

pub mod types;
pub mod error;
pub mod store;
pub mod file_store;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod logging;
pub mod schedule;
pub mod calendar;
pub mod session;
pub mod badges;
pub mod completion;
pub mod plans;
pub mod stats;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use store::{Filter, MemoryStore, Record, RecordStore, SortKey, Stored};
pub use file_store::JsonFileStore;
pub use identity::{ConfiguredIdentity, IdentityProvider};
pub use schedule::ScheduleExpander;
pub use session::{SessionEngine, SessionPhase, TimerToken};
pub use completion::{complete_session, CompletionOutcome};
pub use stats::DashboardStats;
