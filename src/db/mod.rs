// src/db/mod.rs

mod memory;
mod postgres;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use thiserror::Error;
use tracing::info;

use crate::models::{Assessment, NewAssessment, NewUser, User, UserPatch};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Record store for users and assessment snapshots.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Apply the non-empty fields of `patch`. Fails with `Conflict` if the new
    /// email belongs to another user.
    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, StoreError>;

    async fn insert_assessment(&self, new: NewAssessment) -> Result<Assessment, StoreError>;

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, StoreError>;

    /// Assessments owned by `user_id` (or anonymous ones for `None`), newest first.
    async fn list_assessments(&self, user_id: Option<i64>) -> Result<Vec<Assessment>, StoreError>;
}

pub async fn connect(database_url: &str) -> anyhow::Result<Pool<Postgres>> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("connected to PostgreSQL");
    Ok(pool)
}
