use serde::{Deserialize, Serialize};

use crate::db::AnnotatedEntry;
use crate::entities::children;
use crate::entities::time_entries::EntryKind;
use crate::entities::users::Role;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChildDto {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub daily_allowance: i32,
    pub current_time: i32,
    pub last_reset: String,
    pub has_login: bool,
    pub time_entries: Vec<TimeEntryDto>,
}

impl ChildDto {
    #[must_use]
    pub fn from_parts(child: children::Model, entries: Vec<AnnotatedEntry>) -> Self {
        Self {
            id: child.id,
            name: child.name,
            username: child.username,
            daily_allowance: child.daily_allowance,
            current_time: child.current_time,
            last_reset: child.last_reset,
            has_login: child.user_id.is_some(),
            time_entries: entries.into_iter().map(TimeEntryDto::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TimeEntryDto {
    pub id: i64,
    pub child_id: i32,
    pub amount: i32,
    pub reason: String,
    pub kind: EntryKind,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<AnnotatedEntry> for TimeEntryDto {
    fn from(annotated: AnnotatedEntry) -> Self {
        Self {
            id: annotated.entry.id,
            child_id: annotated.entry.child_id,
            amount: annotated.entry.amount,
            reason: annotated.entry.reason,
            kind: annotated.entry.kind,
            created_by: annotated.created_by_username,
            created_at: annotated.entry.created_at,
        }
    }
}

/// Fields are optional so missing input surfaces as a ValidationError
/// rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateChildRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub daily_allowance: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AppendEntryRequest {
    pub child_id: Option<i32>,
    pub amount: Option<i32>,
    pub reason: Option<String>,
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Deserialize)]
pub struct EntriesQuery {
    pub child_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct PrincipalDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct SweepResultDto {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub users: u64,
    pub children: u64,
    pub ledger_entries: u64,
}
