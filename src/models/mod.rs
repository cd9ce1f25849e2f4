// src/models/mod.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::engine::{EngineError, SiteInput, StructureType};

// ───────────────────────────────────────
// Users
// ───────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub location: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

// ───────────────────────────────────────
// Assessments
// ───────────────────────────────────────

/// Site parameters as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub location_desc: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub num_dwellers: i32,
    pub rooftop_area_m2: f64,
    pub open_space_area_m2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_structure: Option<String>,
}

impl AssessmentInput {
    pub fn to_site_input(&self) -> Result<SiteInput, EngineError> {
        let occupants = u32::try_from(self.num_dwellers).map_err(|_| {
            EngineError::InvalidInput(format!(
                "num_dwellers must be non-negative (got {})",
                self.num_dwellers
            ))
        })?;
        let preferred_structure = self
            .preferred_structure
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<StructureType>)
            .transpose()?;

        let site = SiteInput {
            latitude: self.latitude,
            longitude: self.longitude,
            roof_area_m2: self.rooftop_area_m2,
            open_space_area_m2: self.open_space_area_m2,
            occupants,
            preferred_structure,
        };
        site.validate()?;
        Ok(site)
    }
}

/// Persisted assessment. `results` is the recommendation snapshot taken at
/// creation time and is served back verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assessment {
    pub id: i64,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub location_desc: String,
    pub latitude: f64,
    pub longitude: f64,
    pub num_dwellers: i32,
    pub rooftop_area_m2: f64,
    pub open_space_area_m2: f64,
    pub preferred_structure: Option<String>,
    pub results: serde_json::Value, // jsonb
}

#[derive(Debug, Clone)]
pub struct NewAssessment {
    pub user_id: Option<i64>,
    pub input: AssessmentInput,
    pub results: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssessmentOut {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub inputs: AssessmentInput,
    pub results: serde_json::Value,
}

impl From<Assessment> for AssessmentOut {
    fn from(a: Assessment) -> Self {
        AssessmentOut {
            id: a.id,
            created_at: a.created_at,
            latitude: a.latitude,
            longitude: a.longitude,
            inputs: AssessmentInput {
                user_name: a.user_name,
                location_desc: a.location_desc,
                latitude: a.latitude,
                longitude: a.longitude,
                num_dwellers: a.num_dwellers,
                rooftop_area_m2: a.rooftop_area_m2,
                open_space_area_m2: a.open_space_area_m2,
                preferred_structure: a.preferred_structure,
            },
            results: a.results,
        }
    }
}

// ───────────────────────────────────────
// Gamification
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub user_id: i64,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBadge {
    pub badge: Badge,
    pub awarded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub points: i64,
    pub group: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AssessmentInput {
        AssessmentInput {
            user_name: "Asha".into(),
            location_desc: "Jayanagar".into(),
            latitude: 12.93,
            longitude: 77.58,
            num_dwellers: 5,
            rooftop_area_m2: 110.0,
            open_space_area_m2: 12.0,
            preferred_structure: None,
        }
    }

    #[test]
    fn converts_to_site_input() {
        let mut i = input();
        i.preferred_structure = Some("trench".into());
        let site = i.to_site_input().unwrap();
        assert_eq!(site.occupants, 5);
        assert_eq!(site.preferred_structure, Some(StructureType::Trench));
    }

    #[test]
    fn blank_preference_means_auto() {
        let mut i = input();
        i.preferred_structure = Some("  ".into());
        assert_eq!(i.to_site_input().unwrap().preferred_structure, None);
    }

    #[test]
    fn rejects_unknown_structure_and_negative_counts() {
        let mut i = input();
        i.preferred_structure = Some("dug_well".into());
        assert!(i.to_site_input().is_err());

        let mut i = input();
        i.num_dwellers = -2;
        assert!(i.to_site_input().is_err());

        let mut i = input();
        i.open_space_area_m2 = -0.5;
        assert!(i.to_site_input().is_err());
    }
}
