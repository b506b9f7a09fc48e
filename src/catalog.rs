use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;

use crate::models::{ClassName, ClassSession, SessionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("Class {0} must have a capacity greater than zero")]
    InvalidCapacity(SessionId),
    #[error("Class id {0} is used more than once")]
    DuplicateSessionId(SessionId),
    #[error("Class {id} has an unreadable start time {value:?}")]
    UnparseableStartTime { id: SessionId, value: String },
    #[error("Class {id} starts at {local}, which does not map to a single instant in {zone}")]
    InvalidStartTime {
        id: SessionId,
        local: NaiveDateTime,
        zone: Tz,
    },
}

/// Entry used to seed a catalog: start time is local to the reference zone.
#[derive(Debug, Clone)]
pub struct SessionSeed {
    pub id: SessionId,
    pub name: ClassName,
    pub instructor: String,
    pub local_start: NaiveDateTime,
    pub capacity: u32,
}

/// A session with its start converted into a display zone.
#[derive(Debug, Clone)]
pub struct ScheduledClass<'a> {
    pub session: &'a ClassSession,
    pub starts_at: DateTime<Tz>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    reference: Tz,
    sessions: Vec<ClassSession>,
}

pub fn parse_timezone(name: &str) -> Result<Tz, CatalogError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CatalogError::InvalidTimezone(name.to_string()))
}

const SEED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DEFAULT_CLASSES: [(SessionId, ClassName, &str, &str, u32); 3] = [
    (1, ClassName::Yoga, "Alice", "2025-08-22 08:00:00", 10),
    (2, ClassName::Zumba, "Bob", "2025-08-22 10:00:00", 12),
    (3, ClassName::Hiit, "Charlie", "2025-08-22 18:00:00", 15),
];

impl SessionSeed {
    /// `local_start` is `YYYY-MM-DD HH:MM:SS` wall time in the reference zone.
    pub fn parse(
        id: SessionId,
        name: ClassName,
        instructor: impl Into<String>,
        local_start: &str,
        capacity: u32,
    ) -> Result<Self, CatalogError> {
        let local_start = NaiveDateTime::parse_from_str(local_start, SEED_TIME_FORMAT).map_err(
            |_| CatalogError::UnparseableStartTime {
                id,
                value: local_start.to_string(),
            },
        )?;
        Ok(Self {
            id,
            name,
            instructor: instructor.into(),
            local_start,
            capacity,
        })
    }
}

pub fn default_seeds() -> Result<Vec<SessionSeed>, CatalogError> {
    DEFAULT_CLASSES
        .iter()
        .map(|&(id, name, instructor, start, capacity)| {
            SessionSeed::parse(id, name, instructor, start, capacity)
        })
        .collect()
}

impl Catalog {
    pub fn new(reference: Tz, seeds: Vec<SessionSeed>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(seeds.len());
        let mut sessions = Vec::with_capacity(seeds.len());

        for seed in seeds {
            if seed.capacity == 0 {
                return Err(CatalogError::InvalidCapacity(seed.id));
            }
            if !seen.insert(seed.id) {
                return Err(CatalogError::DuplicateSessionId(seed.id));
            }
            let starts_at = reference
                .from_local_datetime(&seed.local_start)
                .single()
                .ok_or(CatalogError::InvalidStartTime {
                    id: seed.id,
                    local: seed.local_start,
                    zone: reference,
                })?;
            sessions.push(ClassSession {
                id: seed.id,
                name: seed.name,
                instructor: seed.instructor,
                starts_at,
                capacity: seed.capacity,
            });
        }

        sessions.sort_by_key(|s| s.starts_at);
        Ok(Self {
            reference,
            sessions,
        })
    }

    pub fn with_default_classes(reference: Tz) -> Result<Self, CatalogError> {
        Self::new(reference, default_seeds()?)
    }

    pub fn reference_timezone(&self) -> Tz {
        self.reference
    }

    pub fn sessions(&self) -> &[ClassSession] {
        &self.sessions
    }

    pub fn get(&self, id: SessionId) -> Option<&ClassSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Converts every session's start into `timezone` for display.
    pub fn list_sessions(&self, timezone: &str) -> Result<Vec<ScheduledClass<'_>>, CatalogError> {
        let target = parse_timezone(timezone)?;
        Ok(self
            .sessions
            .iter()
            .map(|session| ScheduledClass {
                session,
                starts_at: session.starts_at.with_timezone(&target),
            })
            .collect())
    }
}
