// src/routes/soil.rs

use axum::{extract::Query, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::check_coordinates;
use crate::{
    error::ApiResult,
    services::soil::{property_table, soil_at, SoilAtLocation},
};

const REFERENCE: &str = "USDA Soil Survey Manual";

#[derive(Deserialize)]
pub struct LocationQ {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
}

#[derive(Serialize)]
pub struct SearchArea {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

#[derive(Serialize)]
pub struct SoilResp {
    pub location: SearchArea,
    pub soil_data: SoilAtLocation,
    pub distance_km: f64,
}

pub async fn location(Query(q): Query<LocationQ>) -> ApiResult<Json<SoilResp>> {
    check_coordinates(q.latitude, q.longitude)?;
    Ok(Json(SoilResp {
        location: SearchArea {
            latitude: q.latitude,
            longitude: q.longitude,
            radius_km: q.radius_km.unwrap_or(5.0),
        },
        soil_data: soil_at(q.latitude, q.longitude),
        distance_km: 0.0,
    }))
}

pub async fn infiltration_rates() -> Json<Value> {
    Json(json!({
        "infiltration_rates_mm_per_hour": property_table(|c| c.infiltration),
        "description": "Typical infiltration rates for different soil types",
        "source": REFERENCE,
    }))
}

pub async fn permeability_rates() -> Json<Value> {
    Json(json!({
        "permeability_rates_cm_per_hour": property_table(|c| c.permeability),
        "description": "Typical permeability rates for different soil types",
        "source": REFERENCE,
    }))
}

pub async fn water_holding_capacity() -> Json<Value> {
    Json(json!({
        "water_holding_capacity_mm": property_table(|c| c.water_holding),
        "description": "Typical water holding capacity for different soil types",
        "source": REFERENCE,
    }))
}
