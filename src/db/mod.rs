use crate::domain::scoring::ScoreResult;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// `round_number` stored for combined two-round submissions. Values 1 and 2
/// belong to legacy single-round records that may still exist in the table.
pub const COMPLETE_ROUND_MARKER: i16 = 3;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub hash: String,
    pub age: Option<i16>,
    pub gender: Option<String>,
    pub occupation: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub round_number: i16,
    pub answers: serde_json::Value,
    pub score: i32,
    pub risk_level: String,
    pub round1_score: i32,
    pub round2_score: i32,
    pub total_score: i32,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub hash: &'a str,
    pub age: Option<i16>,
    pub gender: Option<&'a str>,
    pub occupation: Option<&'a str>,
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT
            id,
            name,
            email,
            hash,
            age,
            gender,
            occupation,
            created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        SELECT
            id,
            name,
            email,
            hash,
            age,
            gender,
            occupation,
            created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn insert_user(pool: &PgPool, new_user: NewUser<'_>) -> Result<DbUser> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        INSERT INTO users (id, name, email, hash, age, gender, occupation)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING
            id,
            name,
            email,
            hash,
            age,
            gender,
            occupation,
            created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new_user.name)
    .bind(new_user.email)
    .bind(new_user.hash)
    .bind(new_user.age)
    .bind(new_user.gender)
    .bind(new_user.occupation)
    .fetch_one(pool)
    .await?;
    Ok(user)
}

pub async fn update_user_profile(
    pool: &PgPool,
    id: Uuid,
    name: &str,
    age: Option<i16>,
    gender: Option<&str>,
    occupation: Option<&str>,
) -> Result<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(
        r#"
        UPDATE users
        SET name = $2, age = $3, gender = $4, occupation = $5
        WHERE id = $1
        RETURNING
            id,
            name,
            email,
            hash,
            age,
            gender,
            occupation,
            created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(age)
    .bind(gender)
    .bind(occupation)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// All of a user's assessments, newest first. Includes any legacy
/// single-round rows alongside complete ones.
pub async fn list_assessments(pool: &PgPool, user_id: Uuid) -> Result<Vec<Assessment>> {
    let assessments = sqlx::query_as::<_, Assessment>(
        r#"
        SELECT
            id,
            user_id,
            round_number,
            answers,
            score,
            risk_level,
            round1_score,
            round2_score,
            total_score,
            created_at
        FROM assessments
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(assessments)
}

/// Persist a complete assessment: both raw answer sets as one JSON document
/// plus the four score fields. The timestamp is server-assigned.
pub async fn insert_assessment(
    pool: &PgPool,
    user_id: Uuid,
    answers: &serde_json::Value,
    result: &ScoreResult,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO assessments
            (id, user_id, round_number, answers, score, risk_level,
             round1_score, round2_score, total_score)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(COMPLETE_ROUND_MARKER)
    .bind(answers)
    .bind(result.total_score)
    .bind(result.risk_level.as_str())
    .bind(result.round1_score)
    .bind(result.round2_score)
    .bind(result.total_score)
    .execute(pool)
    .await?;
    Ok(id)
}
