use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::children;
use crate::entities::time_entries::EntryKind;

pub mod migrator;
pub mod repositories;

pub use repositories::child::NewChild;
pub use repositories::entry::AnnotatedEntry;
pub use repositories::user::User;

/// Facade over the repositories; cheap to clone, shares one connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with("sqlite::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn child_repo(&self) -> repositories::child::ChildRepository {
        repositories::child::ChildRepository::new(self.conn.clone())
    }

    fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn verify_user_password(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn hash_password(&self, password: &str, config: &SecurityConfig) -> Result<String> {
        repositories::user::hash_password_blocking(password, config).await
    }

    // Children

    pub async fn create_child(&self, input: NewChild<'_>) -> Result<children::Model> {
        self.child_repo().create(input).await
    }

    pub async fn get_child(&self, id: i32) -> Result<Option<children::Model>> {
        self.child_repo().get(id).await
    }

    pub async fn get_child_by_user(&self, user_id: i32) -> Result<Option<children::Model>> {
        self.child_repo().get_by_user(user_id).await
    }

    pub async fn get_child_by_username(&self, username: &str) -> Result<Option<children::Model>> {
        self.child_repo().get_by_username(username).await
    }

    pub async fn count_children(&self) -> Result<u64> {
        self.child_repo().count().await
    }

    pub async fn list_children_for_parent(&self, parent_id: i32) -> Result<Vec<children::Model>> {
        self.child_repo().list_for_parent(parent_id).await
    }

    pub async fn delete_child(&self, id: i32) -> Result<bool> {
        self.child_repo().delete(id).await
    }

    pub async fn apply_entry(
        &self,
        child_id: i32,
        kind: EntryKind,
        magnitude: i32,
        reason: &str,
        actor_id: i32,
    ) -> Result<Option<children::Model>> {
        self.child_repo()
            .apply_entry(child_id, kind, magnitude, reason, actor_id)
            .await
    }

    pub async fn reset_child(
        &self,
        child_id: i32,
        actor_id: i32,
        reason: &str,
        now: &str,
    ) -> Result<Option<children::Model>> {
        self.child_repo().reset(child_id, actor_id, reason, now).await
    }

    pub async fn children_due_for_reset(&self, cutoff: &str) -> Result<Vec<children::Model>> {
        self.child_repo().due_for_reset(cutoff).await
    }

    // Ledger

    pub async fn recent_entries(&self, child_id: i32, limit: u64) -> Result<Vec<AnnotatedEntry>> {
        self.entry_repo().recent_for_child(child_id, limit).await
    }

    pub async fn count_entries(&self) -> Result<u64> {
        self.entry_repo().count().await
    }
}
