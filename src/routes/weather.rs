// src/routes/weather.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::check_coordinates;
use crate::{
    error::{ApiError, ApiResult},
    services::weather::{WeatherData, MAX_FORECAST_DAYS},
    AppState,
};

#[derive(Deserialize)]
pub struct LocationQ {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct ForecastQ {
    pub latitude: f64,
    pub longitude: f64,
    pub days: Option<u32>,
}

#[derive(Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize)]
pub struct ForecastResp {
    pub forecast: Vec<WeatherData>,
    pub days: u32,
    pub location: Location,
    pub source: &'static str,
    pub generated_at: DateTime<Utc>,
}

pub async fn current(State(state): State<AppState>, Query(q): Query<LocationQ>) -> ApiResult<Json<WeatherData>> {
    check_coordinates(q.latitude, q.longitude)?;
    Ok(Json(state.weather.current(q.latitude, q.longitude).await))
}

pub async fn forecast(
    State(state): State<AppState>,
    Query(q): Query<ForecastQ>,
) -> ApiResult<Json<ForecastResp>> {
    check_coordinates(q.latitude, q.longitude)?;
    let days = q.days.unwrap_or(MAX_FORECAST_DAYS);
    if !(1..=MAX_FORECAST_DAYS).contains(&days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {MAX_FORECAST_DAYS}"
        )));
    }

    let forecast = state.weather.forecast(q.latitude, q.longitude, days).await;
    Ok(Json(ForecastResp {
        forecast,
        days,
        location: Location { latitude: q.latitude, longitude: q.longitude },
        source: state.weather.source(),
        generated_at: Utc::now(),
    }))
}
