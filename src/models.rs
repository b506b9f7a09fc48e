use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::ScheduledClass;

pub type SessionId = u32;
pub type BookingId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum ClassName {
    Yoga,
    Zumba,
    #[serde(rename = "HIIT")]
    Hiit,
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassName::Yoga => "Yoga",
            ClassName::Zumba => "Zumba",
            ClassName::Hiit => "HIIT",
        };
        f.write_str(name)
    }
}

/// A bookable class. The start instant is kept in the studio's reference zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSession {
    pub id: SessionId,
    pub name: ClassName,
    pub instructor: String,
    pub starts_at: DateTime<Tz>,
    pub capacity: u32,
}

/// A class as shown to clients, localized to the requested zone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassView {
    pub id: SessionId,
    pub name: ClassName,
    pub instructor: String,
    #[schema(value_type = String, format = "date-time", example = "2025-08-21T22:30:00-04:00")]
    pub starts_at: DateTime<FixedOffset>,
    #[schema(example = "2025-08-21 22:30:00 EDT-0400")]
    pub schedule: String,
    #[schema(example = "America/New_York")]
    pub timezone: String,
    pub capacity: u32,
    pub available_slots: u32,
}

impl ClassView {
    pub fn new(class: &ScheduledClass<'_>, booked: usize) -> Self {
        let session = class.session;
        let booked = u32::try_from(booked).unwrap_or(u32::MAX);
        Self {
            id: session.id,
            name: session.name,
            instructor: session.instructor.clone(),
            starts_at: class.starts_at.fixed_offset(),
            schedule: class
                .starts_at
                .format("%Y-%m-%d %H:%M:%S %Z%z")
                .to_string(),
            timezone: class.starts_at.timezone().name().to_string(),
            capacity: session.capacity,
            available_slots: session.capacity.saturating_sub(booked),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(alias = "class_id")]
    #[schema(example = 1)]
    pub session_id: SessionId,
    #[serde(alias = "client_email")]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[serde(default, alias = "client_name")]
    #[schema(example = "Jane Doe")]
    pub client_name: Option<String>,
}

impl BookingRequest {
    pub fn new(session_id: SessionId, email: impl Into<String>) -> Self {
        Self {
            session_id,
            email: email.into(),
            client_name: None,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub session_id: SessionId,
    pub class_name: ClassName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    pub email: String,
    #[schema(value_type = String, format = "date-time")]
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "SessionFull")]
    pub error: String,
    pub message: String,
}
