// src/routes/gamification.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    models::{LeaderboardEntry, Score, UserBadge},
    AppState,
};

const DEFAULT_LEADERBOARD: usize = 10;
const MAX_LEADERBOARD: usize = 100;

#[derive(Deserialize)]
pub struct AwardPointsQ {
    pub user_id: i64,
    pub points: i64,
}

#[derive(Deserialize)]
pub struct AwardBadgeQ {
    pub user_id: i64,
    pub badge_id: i64,
}

#[derive(Deserialize)]
pub struct UserQ {
    pub user_id: i64,
}

#[derive(Deserialize)]
pub struct LeaderboardQ {
    pub limit: Option<usize>,
}

pub async fn award_points(
    State(state): State<AppState>,
    Query(q): Query<AwardPointsQ>,
) -> ApiResult<Json<Score>> {
    let score = state
        .gamification
        .award_points(q.user_id, q.points)
        .await
        .ok_or_else(|| ApiError::BadRequest("points total out of range".into()))?;
    info!(user_id = q.user_id, awarded = q.points, total = score.points, "points awarded");
    Ok(Json(score))
}

pub async fn award_badge(
    State(state): State<AppState>,
    Query(q): Query<AwardBadgeQ>,
) -> ApiResult<Json<UserBadge>> {
    state
        .gamification
        .award_badge(q.user_id, q.badge_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Badge not found".into()))
}

pub async fn user_points(State(state): State<AppState>, Query(q): Query<UserQ>) -> Json<Score> {
    Json(state.gamification.points(q.user_id).await)
}

pub async fn user_badges(State(state): State<AppState>, Query(q): Query<UserQ>) -> Json<Vec<UserBadge>> {
    Json(state.gamification.badges(q.user_id).await)
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQ>,
) -> Json<Vec<LeaderboardEntry>> {
    let limit = q.limit.unwrap_or(DEFAULT_LEADERBOARD).clamp(1, MAX_LEADERBOARD);
    Json(state.gamification.leaderboard(limit).await)
}
