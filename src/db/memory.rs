// src/db/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, StoreError};
use crate::models::{Assessment, NewAssessment, NewUser, User, UserPatch};

/// Process-local store used when no `DATABASE_URL` is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    assessments: Vec<Assessment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut t = self.inner.write().await;
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        let user = User {
            id: t.users.len() as i64 + 1,
            email: new.email,
            name: new.name,
            location: None,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, StoreError> {
        let mut t = self.inner.write().await;
        if let Some(email) = &patch.email {
            if t.users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(StoreError::Conflict("Email already in use".into()));
            }
        }
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound("User".into()))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(location) = patch.location {
            user.location = Some(location);
        }
        Ok(user.clone())
    }

    async fn insert_assessment(&self, new: NewAssessment) -> Result<Assessment, StoreError> {
        let mut t = self.inner.write().await;
        let i = new.input;
        let row = Assessment {
            id: t.assessments.len() as i64 + 1,
            user_id: new.user_id,
            created_at: Utc::now(),
            user_name: i.user_name,
            location_desc: i.location_desc,
            latitude: i.latitude,
            longitude: i.longitude,
            num_dwellers: i.num_dwellers,
            rooftop_area_m2: i.rooftop_area_m2,
            open_space_area_m2: i.open_space_area_m2,
            preferred_structure: i.preferred_structure,
            results: new.results,
        };
        t.assessments.push(row.clone());
        Ok(row)
    }

    async fn get_assessment(&self, id: i64) -> Result<Option<Assessment>, StoreError> {
        let t = self.inner.read().await;
        Ok(t.assessments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_assessments(&self, user_id: Option<i64>) -> Result<Vec<Assessment>, StoreError> {
        let t = self.inner.read().await;
        // insertion order is creation order; newest first
        Ok(t
            .assessments
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssessmentInput;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            name: "Ravi".into(),
            password_hash: "salt$hash".into(),
        }
    }

    fn new_assessment(user_id: Option<i64>) -> NewAssessment {
        NewAssessment {
            user_id,
            input: AssessmentInput {
                user_name: "Ravi".into(),
                location_desc: "Pune".into(),
                latitude: 18.52,
                longitude: 73.85,
                num_dwellers: 3,
                rooftop_area_m2: 90.0,
                open_space_area_m2: 4.0,
                preferred_structure: None,
            },
            results: serde_json::json!({ "recharge_potential_liters": 1.0 }),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.test")).await.unwrap();
        let err = store.create_user(new_user("a@x.test")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_user_checks_email_owner() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@x.test")).await.unwrap();
        store.create_user(new_user("b@x.test")).await.unwrap();

        let patch = UserPatch { email: Some("b@x.test".into()), ..UserPatch::default() };
        assert!(matches!(store.update_user(a.id, patch).await, Err(StoreError::Conflict(_))));

        let patch = UserPatch { location: Some("Nashik".into()), ..UserPatch::default() };
        let updated = store.update_user(a.id, patch).await.unwrap();
        assert_eq!(updated.location.as_deref(), Some("Nashik"));
        assert_eq!(updated.email, "a@x.test");
    }

    #[tokio::test]
    async fn lists_by_owner_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert_assessment(new_assessment(Some(1))).await.unwrap();
        store.insert_assessment(new_assessment(None)).await.unwrap();
        let third = store.insert_assessment(new_assessment(Some(1))).await.unwrap();

        let mine = store.list_assessments(Some(1)).await.unwrap();
        assert_eq!(mine.iter().map(|a| a.id).collect::<Vec<_>>(), vec![third.id, first.id]);
        assert_eq!(store.list_assessments(None).await.unwrap().len(), 1);
        assert!(store.get_assessment(99).await.unwrap().is_none());
    }
}
