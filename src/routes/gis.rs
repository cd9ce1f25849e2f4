// src/routes/gis.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::check_coordinates;
use crate::{error::ApiResult, services::context::GroundwaterContext, AppState};

#[derive(Deserialize)]
pub struct PointQ {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize)]
pub struct RainfallResp {
    pub annual_rainfall_mm: f64,
}

#[derive(Serialize)]
pub struct AquiferResp {
    pub aquifer_type: String,
    pub transmissivity_m2_per_day: f64,
    pub storativity: f64,
}

#[derive(Serialize)]
pub struct GwDepthResp {
    pub gw_depth_m: f64,
}

pub async fn rainfall(State(state): State<AppState>, Query(q): Query<PointQ>) -> ApiResult<Json<RainfallResp>> {
    check_coordinates(q.lat, q.lon)?;
    let annual_rainfall_mm = state.context.annual_rainfall_mm(q.lat, q.lon).await;
    Ok(Json(RainfallResp { annual_rainfall_mm }))
}

pub async fn groundwater(
    State(state): State<AppState>,
    Query(q): Query<PointQ>,
) -> ApiResult<Json<GroundwaterContext>> {
    check_coordinates(q.lat, q.lon)?;
    Ok(Json(state.context.groundwater_context(q.lat, q.lon).await))
}

pub async fn aquifer(State(state): State<AppState>, Query(q): Query<PointQ>) -> ApiResult<Json<AquiferResp>> {
    check_coordinates(q.lat, q.lon)?;
    let ctx = state.context.groundwater_context(q.lat, q.lon).await;
    Ok(Json(AquiferResp {
        aquifer_type: ctx.aquifer_type,
        transmissivity_m2_per_day: ctx.transmissivity_m2_per_day,
        storativity: ctx.storativity,
    }))
}

pub async fn gw_depth(State(state): State<AppState>, Query(q): Query<PointQ>) -> ApiResult<Json<GwDepthResp>> {
    check_coordinates(q.lat, q.lon)?;
    let ctx = state.context.groundwater_context(q.lat, q.lon).await;
    Ok(Json(GwDepthResp { gw_depth_m: ctx.gw_depth_m }))
}
