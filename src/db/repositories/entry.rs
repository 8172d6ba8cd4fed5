use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::prelude::*;
use crate::entities::{time_entries, users};

/// A ledger entry paired with the username of the user who created it.
#[derive(Debug, Clone)]
pub struct AnnotatedEntry {
    pub entry: time_entries::Model,
    pub created_by_username: Option<String>,
}

pub struct EntryRepository {
    conn: DatabaseConnection,
}

impl EntryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Most recent entries for a child, newest first, annotated with the
    /// creating user's username.
    pub async fn recent_for_child(&self, child_id: i32, limit: u64) -> Result<Vec<AnnotatedEntry>> {
        let rows = TimeEntries::find()
            .filter(time_entries::Column::ChildId.eq(child_id))
            .order_by_desc(time_entries::Column::CreatedAt)
            .order_by_desc(time_entries::Column::Id)
            .limit(limit)
            .find_also_related(Users)
            .all(&self.conn)
            .await
            .context("Failed to query ledger entries")?;

        Ok(rows
            .into_iter()
            .map(|(entry, user)| AnnotatedEntry {
                entry,
                created_by_username: user.map(|u: users::Model| u.username),
            })
            .collect())
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        TimeEntries::find()
            .count(&self.conn)
            .await
            .context("Failed to count ledger entries")
    }
}
