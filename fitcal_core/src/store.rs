//! Generic record store used for all persisted entities.
//!
//! Records are kept as JSON objects wrapped in a [`Stored`] envelope that adds
//! an id, a creation timestamp and a version counter. Two implementations are
//! provided: [`MemoryStore`] here and [`crate::file_store::JsonFileStore`].

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Field names owned by the envelope; patches may not touch them
const ENVELOPE_FIELDS: [&str; 3] = ["id", "created_date", "version"];

/// The typed collections a store holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Workout,
    WorkoutPlan,
    ScheduledWorkout,
    WorkoutSession,
    UserProfile,
}

impl EntityKind {
    /// Name used for the collection on disk
    pub fn collection_name(self) -> &'static str {
        match self {
            EntityKind::Workout => "workouts",
            EntityKind::WorkoutPlan => "workout_plans",
            EntityKind::ScheduledWorkout => "scheduled_workouts",
            EntityKind::WorkoutSession => "workout_sessions",
            EntityKind::UserProfile => "user_profiles",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Workout => "Workout",
            EntityKind::WorkoutPlan => "WorkoutPlan",
            EntityKind::ScheduledWorkout => "ScheduledWorkout",
            EntityKind::WorkoutSession => "WorkoutSession",
            EntityKind::UserProfile => "UserProfile",
        };
        f.write_str(name)
    }
}

/// A type that can live in a record store collection
pub trait Record: Serialize + DeserializeOwned + Clone {
    const KIND: EntityKind;
}

/// A persisted record with its store-assigned metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Stored<R> {
    pub id: String,
    pub created_date: DateTime<Utc>,
    pub version: u64,
    #[serde(flatten)]
    pub record: R,
}

/// Field-equality predicate over stored records
#[derive(Clone, Debug, Default)]
pub struct Filter {
    fields: Map<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, record: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }
}

/// Field-based ordering; a leading `-` means descending
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(key: &str) -> Self {
        match key.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                descending: true,
            },
            None => Self {
                field: key.to_string(),
                descending: false,
            },
        }
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ordering = compare_values(a.get(&self.field), b.get(&self.field));
        if self.descending {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// Missing values sort first; mismatched types compare equal
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// The persistence collaborator.
///
/// Methods are generic over the record type; the collection is picked from
/// [`Record::KIND`].
pub trait RecordStore {
    /// All records of a kind, in insertion order
    fn list<R: Record>(&self) -> Result<Vec<Stored<R>>>;

    /// Records matching `filter`, optionally ordered by `sort`
    fn filter<R: Record>(&self, filter: &Filter, sort: Option<&SortKey>) -> Result<Vec<Stored<R>>>;

    fn get<R: Record>(&self, id: &str) -> Result<Stored<R>>;

    /// Persist N records in one call. Either all are stored or none.
    fn bulk_create<R: Record>(&mut self, records: Vec<R>) -> Result<Vec<Stored<R>>>;

    /// Merge `patch` into the record, failing with `VersionConflict` when
    /// `expected_version` is given and no longer current.
    fn update_versioned<R: Record>(
        &mut self,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Stored<R>>;

    fn delete<R: Record>(&mut self, id: &str) -> Result<()>;

    fn create<R: Record>(&mut self, record: R) -> Result<Stored<R>> {
        let mut created = self.bulk_create(vec![record])?;
        created
            .pop()
            .ok_or_else(|| Error::Other(format!("{} create returned no record", R::KIND)))
    }

    /// The first record matching `filter`, or `record` newly created when
    /// none matches. Implementations that share storage between processes
    /// must do the check and the create under one lock.
    fn find_or_create<R: Record>(&mut self, filter: &Filter, record: R) -> Result<Stored<R>> {
        match self.filter::<R>(filter, None)?.into_iter().next() {
            Some(existing) => Ok(existing),
            None => self.create(record),
        }
    }

    /// Unconditional merge (last write wins)
    fn update<R: Record>(&mut self, id: &str, patch: Value) -> Result<Stored<R>> {
        self.update_versioned(id, patch, None)
    }
}

/// One collection's raw JSON objects. Shared by both store implementations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Collection {
    records: Vec<Value>,
}

impl Collection {
    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn list<R: Record>(&self) -> Result<Vec<Stored<R>>> {
        self.records
            .iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
            .collect()
    }

    pub(crate) fn filter<R: Record>(
        &self,
        filter: &Filter,
        sort: Option<&SortKey>,
    ) -> Result<Vec<Stored<R>>> {
        let mut matching: Vec<&Value> = self.records.iter().filter(|v| filter.matches(v)).collect();
        if let Some(key) = sort {
            matching.sort_by(|a, b| key.compare(a, b));
        }
        matching
            .into_iter()
            .map(|v| serde_json::from_value(v.clone()).map_err(Error::from))
            .collect()
    }

    pub(crate) fn get<R: Record>(&self, id: &str) -> Result<Stored<R>> {
        let value = self
            .position(id)
            .map(|pos| self.records[pos].clone())
            .ok_or_else(|| Error::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            })?;
        Ok(serde_json::from_value(value)?)
    }

    /// Wrap and serialize every record before inserting any of them
    pub(crate) fn insert_all<R: Record>(
        &mut self,
        records: Vec<R>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Stored<R>>> {
        let stored: Vec<Stored<R>> = records
            .into_iter()
            .map(|record| Stored {
                id: Uuid::new_v4().to_string(),
                created_date: now,
                version: 1,
                record,
            })
            .collect();

        let values = stored
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        self.records.extend(values);
        Ok(stored)
    }

    pub(crate) fn update<R: Record>(
        &mut self,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Stored<R>> {
        let Value::Object(patch) = patch else {
            return Err(Error::Validation(format!(
                "{} update patch must be a JSON object",
                R::KIND
            )));
        };

        let pos = self.position(id).ok_or_else(|| Error::NotFound {
            kind: R::KIND,
            id: id.to_string(),
        })?;

        let mut merged = match &self.records[pos] {
            Value::Object(existing) => existing.clone(),
            _ => {
                return Err(Error::Other(format!(
                    "{} record {} is not a JSON object",
                    R::KIND,
                    id
                )))
            }
        };

        let actual = merged.get("version").and_then(Value::as_u64).unwrap_or(0);
        if let Some(expected) = expected_version {
            if expected != actual {
                return Err(Error::VersionConflict {
                    kind: R::KIND,
                    id: id.to_string(),
                    expected,
                    actual,
                });
            }
        }

        for (field, value) in patch {
            if !ENVELOPE_FIELDS.contains(&field.as_str()) {
                merged.insert(field, value);
            }
        }
        merged.insert("version".into(), Value::from(actual + 1));

        // Reject patches that would leave the record unreadable
        let stored: Stored<R> = serde_json::from_value(Value::Object(merged))?;
        self.records[pos] = serde_json::to_value(&stored)?;
        Ok(stored)
    }

    pub(crate) fn delete(&mut self, kind: EntityKind, id: &str) -> Result<()> {
        let pos = self.position(id).ok_or_else(|| Error::NotFound {
            kind,
            id: id.to_string(),
        })?;
        self.records.remove(pos);
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records
            .iter()
            .position(|v| v.get("id").and_then(Value::as_str) == Some(id))
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: HashMap<EntityKind, Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, kind: EntityKind) -> Option<&Collection> {
        self.collections.get(&kind)
    }

    fn collection_mut(&mut self, kind: EntityKind) -> &mut Collection {
        self.collections.entry(kind).or_default()
    }
}

impl RecordStore for MemoryStore {
    fn list<R: Record>(&self) -> Result<Vec<Stored<R>>> {
        match self.collection(R::KIND) {
            Some(c) => c.list(),
            None => Ok(Vec::new()),
        }
    }

    fn filter<R: Record>(&self, filter: &Filter, sort: Option<&SortKey>) -> Result<Vec<Stored<R>>> {
        match self.collection(R::KIND) {
            Some(c) => c.filter(filter, sort),
            None => Ok(Vec::new()),
        }
    }

    fn get<R: Record>(&self, id: &str) -> Result<Stored<R>> {
        match self.collection(R::KIND) {
            Some(c) => c.get(id),
            None => Err(Error::NotFound {
                kind: R::KIND,
                id: id.to_string(),
            }),
        }
    }

    fn bulk_create<R: Record>(&mut self, records: Vec<R>) -> Result<Vec<Stored<R>>> {
        let created = self.collection_mut(R::KIND).insert_all(records, Utc::now())?;
        tracing::debug!("Created {} {} record(s) in memory", created.len(), R::KIND);
        Ok(created)
    }

    fn update_versioned<R: Record>(
        &mut self,
        id: &str,
        patch: Value,
        expected_version: Option<u64>,
    ) -> Result<Stored<R>> {
        self.collection_mut(R::KIND).update(id, patch, expected_version)
    }

    fn delete<R: Record>(&mut self, id: &str) -> Result<()> {
        self.collection_mut(R::KIND).delete(R::KIND, id)
    }
}
