// src/services/gamification.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::{Badge, LeaderboardEntry, Score, UserBadge};

pub const DEFAULT_GROUP: &str = "community";

#[async_trait]
pub trait GamificationStore: Send + Sync {
    /// Add `points` (may be negative) and return the new total. `None` when
    /// the total would overflow; the stored total is left unchanged.
    async fn award_points(&self, user_id: i64, points: i64) -> Option<Score>;

    /// `None` when `badge_id` is not in the catalogue.
    async fn award_badge(&self, user_id: i64, badge_id: i64) -> Option<UserBadge>;

    async fn points(&self, user_id: i64) -> Score;

    async fn badges(&self, user_id: i64) -> Vec<UserBadge>;

    /// Highest totals first; ties broken by earliest update.
    async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry>;
}

pub fn default_badges() -> Vec<Badge> {
    [
        (1, "Water Saver", "1 lakh L harvested"),
        (2, "Recharge Hero", "5 recharge pits implemented"),
        (3, "Community Leader", "Top 1% on leaderboard"),
    ]
    .into_iter()
    .map(|(id, name, description)| Badge {
        id,
        name: name.to_string(),
        description: description.to_string(),
    })
    .collect()
}

pub struct InMemoryGamification {
    catalogue: Vec<Badge>,
    state: RwLock<GameState>,
}

#[derive(Default)]
struct GameState {
    points: HashMap<i64, (i64, DateTime<Utc>)>,
    badges: HashMap<i64, Vec<UserBadge>>,
}

impl InMemoryGamification {
    pub fn new(catalogue: Vec<Badge>) -> Self {
        Self { catalogue, state: RwLock::default() }
    }
}

impl Default for InMemoryGamification {
    fn default() -> Self {
        Self::new(default_badges())
    }
}

#[async_trait]
impl GamificationStore for InMemoryGamification {
    async fn award_points(&self, user_id: i64, points: i64) -> Option<Score> {
        let now = Utc::now();
        let mut s = self.state.write().await;
        let current = s.points.get(&user_id).map(|(p, _)| *p).unwrap_or(0);
        let total = current.checked_add(points)?;
        s.points.insert(user_id, (total, now));
        Some(Score { user_id, points: total, updated_at: now })
    }

    async fn award_badge(&self, user_id: i64, badge_id: i64) -> Option<UserBadge> {
        let badge = self.catalogue.iter().find(|b| b.id == badge_id)?.clone();
        let awarded = UserBadge { badge, awarded_at: Utc::now() };
        let mut s = self.state.write().await;
        s.badges.entry(user_id).or_default().push(awarded.clone());
        Some(awarded)
    }

    async fn points(&self, user_id: i64) -> Score {
        let s = self.state.read().await;
        let points = s.points.get(&user_id).map(|(p, _)| *p).unwrap_or(0);
        Score { user_id, points, updated_at: Utc::now() }
    }

    async fn badges(&self, user_id: i64) -> Vec<UserBadge> {
        let s = self.state.read().await;
        s.badges.get(&user_id).cloned().unwrap_or_default()
    }

    async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let s = self.state.read().await;
        let mut entries: Vec<LeaderboardEntry> = s
            .points
            .iter()
            .map(|(user_id, (points, updated_at))| LeaderboardEntry {
                user_id: *user_id,
                points: *points,
                group: DEFAULT_GROUP.to_string(),
                updated_at: *updated_at,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(a.updated_at.cmp(&b.updated_at))
                .then(a.user_id.cmp(&b.user_id))
        });
        entries.truncate(limit);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn points_accumulate() {
        let g = InMemoryGamification::default();
        g.award_points(7, 10).await;
        let score = g.award_points(7, 15).await.unwrap();
        assert_eq!(score.points, 25);
        assert_eq!(g.points(7).await.points, 25);
        assert_eq!(g.points(8).await.points, 0);
    }

    #[tokio::test]
    async fn overflowing_total_is_refused() {
        let g = InMemoryGamification::default();
        assert_eq!(g.award_points(1, i64::MAX).await.unwrap().points, i64::MAX);
        assert!(g.award_points(1, i64::MAX).await.is_none());
        assert!(g.award_points(1, 1).await.is_none());
        assert_eq!(g.points(1).await.points, i64::MAX);

        g.award_points(2, -5).await.unwrap();
        assert!(g.award_points(2, i64::MIN).await.is_none());
        assert_eq!(g.points(2).await.points, -5);
    }

    #[tokio::test]
    async fn unknown_badge_is_rejected() {
        let g = InMemoryGamification::default();
        assert!(g.award_badge(1, 42).await.is_none());
        let b = g.award_badge(1, 2).await.unwrap();
        assert_eq!(b.badge.name, "Recharge Hero");
        assert_eq!(g.badges(1).await.len(), 1);
        assert!(g.badges(2).await.is_empty());
    }

    #[tokio::test]
    async fn leaderboard_sorted_and_limited() {
        let g = InMemoryGamification::default();
        g.award_points(1, 5).await;
        g.award_points(2, 50).await;
        g.award_points(3, 20).await;
        let top = g.leaderboard(2).await;
        assert_eq!(top.iter().map(|e| e.user_id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(top.iter().all(|e| e.group == DEFAULT_GROUP));
    }
}
