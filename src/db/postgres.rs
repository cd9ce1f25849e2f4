// src/db/postgres.rs

use async_trait::async_trait;
use sqlx::{query, query_as, Pool, Postgres};
use tracing::info;

use super::{Store, StoreError};
use crate::models::{Assessment, NewAssessment, NewUser, User, UserPatch};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        email         VARCHAR(255) NOT NULL UNIQUE,
        name          VARCHAR(255) NOT NULL,
        location      VARCHAR(255),
        password_hash VARCHAR(255) NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assessments (
        id                  BIGSERIAL PRIMARY KEY,
        user_id             BIGINT REFERENCES users(id) ON DELETE SET NULL,
        created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
        user_name           VARCHAR(255) NOT NULL,
        location_desc       VARCHAR(512) NOT NULL,
        latitude            DOUBLE PRECISION NOT NULL,
        longitude           DOUBLE PRECISION NOT NULL,
        num_dwellers        INTEGER NOT NULL,
        rooftop_area_m2     DOUBLE PRECISION NOT NULL,
        open_space_area_m2  DOUBLE PRECISION NOT NULL,
        preferred_structure VARCHAR(32),
        results             JSONB NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS assessments_user_id_idx ON assessments(user_id)"#,
];

const USER_COLUMNS: &str = "id, email, name, location, password_hash, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Create the tables this service owns if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            query(stmt).execute(&self.pool).await?;
        }
        info!("database schema ensured");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        query_as::<_, User>(&format!(
            "INSERT INTO users(email, name, password_hash) VALUES ($1,$2,$3) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Email already registered".into())
            } else {
                e.into()
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, StoreError> {
        query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                location = COALESCE($4, location)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.email)
        .bind(patch.location)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict("Email already in use".into())
            } else {
                e.into()
            }
        })?
        .ok_or_else(|| StoreError::NotFound("User".into()))
    }

    async fn insert_assessment(&self, new: NewAssessment) -> Result<Assessment, StoreError> {
        let i = new.input;
        let row = query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments
                (user_id, user_name, location_desc, latitude, longitude, num_dwellers,
                 rooftop_area_m2, open_space_area_m2, preferred_structure, results)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            RETURNING id, user_id, created_at, user_name, location_desc, latitude, longitude,
                      num_dwellers, rooftop_area_m2, open_space_area_m2, preferred_structure, results
            "#,
        )
        .bind(new.user_id)
        .bind(i.user_name)
        .bind(i.location_desc)
        .bind(i.latitude)
        .bind(i.longitude)
        .bind(i.num_dwellers)
        .bind(i.rooftop_area_m2)
        .bind(i.open_space_area_m2)
        .bind(i.preferred_structure)
        .bind(new.results)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        let row = query_as::<_, Assessment>(r#"SELECT * FROM assessments WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_assessments(&self, user_id: Option<i64>) -> Result<Vec<Assessment>, StoreError> {
        let rows = if let Some(uid) = user_id {
            query_as::<_, Assessment>(
                r#"SELECT * FROM assessments WHERE user_id = $1 ORDER BY created_at DESC, id DESC"#,
            )
            .bind(uid)
            .fetch_all(&self.pool)
            .await?
        } else {
            query_as::<_, Assessment>(
                r#"SELECT * FROM assessments WHERE user_id IS NULL ORDER BY created_at DESC, id DESC"#,
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows)
    }
}
