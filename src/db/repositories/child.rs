use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, sea_query::Expr,
};
use tracing::info;

use crate::entities::time_entries::{self, EntryKind};
use crate::entities::users::{self, Role};
use crate::entities::{children, prelude::*};
use crate::ledger;

/// Inputs for a new child profile. The password hash is prepared by the
/// caller so no hashing happens inside the transaction.
pub struct NewChild<'a> {
    pub parent_id: i32,
    pub name: &'a str,
    pub username: &'a str,
    pub daily_allowance: i32,
    pub password_hash: Option<&'a str>,
}

pub struct ChildRepository {
    conn: DatabaseConnection,
}

impl ChildRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create a child profile, and a linked login account when a password
    /// hash is supplied, in one transaction. The starting balance equals the
    /// daily allowance.
    pub async fn create(&self, input: NewChild<'_>) -> Result<children::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let user_id = if let Some(hash) = input.password_hash {
            let user = users::ActiveModel {
                username: Set(input.username.to_string()),
                password_hash: Set(hash.to_string()),
                role: Set(Role::Child),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .context("Failed to create login account for child")?;
            Some(user.id)
        } else {
            None
        };

        let child = children::ActiveModel {
            name: Set(input.name.to_string()),
            username: Set(input.username.to_string()),
            daily_allowance: Set(input.daily_allowance),
            current_time: Set(input.daily_allowance),
            last_reset: Set(now.clone()),
            parent_id: Set(input.parent_id),
            user_id: Set(user_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to create child profile")?;

        txn.commit().await?;

        info!(
            child_id = child.id,
            login = user_id.is_some(),
            "Created child profile '{}'",
            child.name
        );
        Ok(child)
    }

    pub async fn get(&self, id: i32) -> Result<Option<children::Model>> {
        Children::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query child by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<children::Model>> {
        Children::find()
            .filter(children::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query child by username")
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;

        Children::find()
            .count(&self.conn)
            .await
            .context("Failed to count children")
    }

    pub async fn get_by_user(&self, user_id: i32) -> Result<Option<children::Model>> {
        Children::find()
            .filter(children::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query child by login user")
    }

    pub async fn list_for_parent(&self, parent_id: i32) -> Result<Vec<children::Model>> {
        Children::find()
            .filter(children::Column::ParentId.eq(parent_id))
            .order_by_asc(children::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list children for parent")
    }

    /// Delete a child, its ledger, and its linked login account in one
    /// transaction. Cascades are explicit here rather than left to the
    /// database.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(child) = Children::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(false);
        };

        TimeEntries::delete_many()
            .filter(time_entries::Column::ChildId.eq(id))
            .exec(&txn)
            .await?;

        Children::delete_by_id(id).exec(&txn).await?;

        if let Some(user_id) = child.user_id {
            Users::delete_by_id(user_id).exec(&txn).await?;
        }

        txn.commit().await?;

        info!("Removed child profile with ID: {}", id);
        Ok(true)
    }

    /// Append a ledger entry and apply its delta to the balance as one
    /// transaction. The balance update is a conditional column expression,
    /// never a read-modify-write, so concurrent appends cannot clobber each
    /// other's deltas. The stored amount is the raw signed delta even when
    /// the balance clamps at zero.
    pub async fn apply_entry(
        &self,
        child_id: i32,
        kind: EntryKind,
        magnitude: i32,
        reason: &str,
        actor_id: i32,
    ) -> Result<Option<children::Model>> {
        let delta = ledger::signed_delta(kind, magnitude);
        let now = chrono::Utc::now().to_rfc3339();

        let txn = self.conn.begin().await?;

        if Children::find_by_id(child_id).one(&txn).await?.is_none() {
            txn.rollback().await?;
            return Ok(None);
        }

        time_entries::ActiveModel {
            child_id: Set(child_id),
            amount: Set(delta),
            reason: Set(reason.to_string()),
            kind: Set(kind),
            created_by: Set(actor_id),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to append ledger entry")?;

        // The identifier must be quoted: bare current_time is SQLite's
        // CURRENT_TIME keyword, not the column.
        Children::update_many()
            .col_expr(
                children::Column::CurrentTime,
                Expr::cust_with_values(r#"MAX(0, "current_time" + ?)"#, [delta]),
            )
            .filter(children::Column::Id.eq(child_id))
            .exec(&txn)
            .await
            .context("Failed to apply balance delta")?;

        let updated = Children::find_by_id(child_id)
            .one(&txn)
            .await?
            .context("Child vanished mid-transaction")?;

        txn.commit().await?;

        Ok(Some(updated))
    }

    /// Restore the balance to the daily allowance, stamp the reset time, and
    /// append a RESET ledger entry, all in one transaction.
    pub async fn reset(
        &self,
        child_id: i32,
        actor_id: i32,
        reason: &str,
        now: &str,
    ) -> Result<Option<children::Model>> {
        let txn = self.conn.begin().await?;

        let Some(child) = Children::find_by_id(child_id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };

        let mut active: children::ActiveModel = child.clone().into();
        active.current_time = Set(child.daily_allowance);
        active.last_reset = Set(now.to_string());
        let updated = active.update(&txn).await?;

        time_entries::ActiveModel {
            child_id: Set(child_id),
            amount: Set(child.daily_allowance),
            reason: Set(reason.to_string()),
            kind: Set(EntryKind::Reset),
            created_by: Set(actor_id),
            created_at: Set(now.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to append reset entry")?;

        txn.commit().await?;

        Ok(Some(updated))
    }

    /// Children whose last reset is older than the cutoff. RFC 3339 UTC
    /// strings compare lexicographically, so a plain string comparison is
    /// sufficient here.
    pub async fn due_for_reset(&self, cutoff: &str) -> Result<Vec<children::Model>> {
        Children::find()
            .filter(children::Column::LastReset.lt(cutoff))
            .all(&self.conn)
            .await
            .context("Failed to query children due for reset")
    }
}
