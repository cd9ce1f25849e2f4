// src/routes/mod.rs

use axum::{
    routing::{get, post},
    Router,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub mod assessments;
pub mod auth;
pub mod chat;
pub mod gamification;
pub mod gis;
pub mod health;
pub mod nasa_power;
pub mod reports;
pub mod soil;
pub mod weather;

/// Everything mounted under the API prefix.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // health
        .route("/health", get(health::health))
        // auth
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).put(auth::update_me))
        // assessments
        .route(
            "/assessments",
            post(assessments::create_assessment).get(assessments::list_assessments),
        )
        .route("/assessments/:id", get(assessments::get_assessment))
        // gis context
        .route("/gis/rainfall", get(gis::rainfall))
        .route("/gis/groundwater", get(gis::groundwater))
        .route("/gis/aquifer", get(gis::aquifer))
        .route("/gis/gw-depth", get(gis::gw_depth))
        // reports (`/reports/:id` only serves `<id>.pdf`)
        .route("/reports/:id", get(reports::standard_pdf))
        .route("/reports/:id/ai.pdf", get(reports::ai_pdf))
        .route("/reports/:id/guide.pdf", get(reports::guide_pdf))
        // chat
        .route("/chat", post(chat::chat))
        .route("/chat/health", get(chat::chat_health))
        // gamification
        .route("/gamification/award-points", post(gamification::award_points))
        .route("/gamification/award-badge", post(gamification::award_badge))
        .route("/gamification/user-points", get(gamification::user_points))
        .route("/gamification/user-badges", get(gamification::user_badges))
        .route("/gamification/leaderboard", get(gamification::leaderboard))
        // weather
        .route("/weather/current", get(weather::current))
        .route("/weather/forecast", get(weather::forecast))
        // nasa power
        .route("/nasa-power/data", get(nasa_power::data))
        .route("/nasa-power/precipitation/summary", get(nasa_power::precipitation_summary))
        .route("/nasa-power/temperature/summary", get(nasa_power::temperature_summary))
        .route("/nasa-power/soil-wetness/summary", get(nasa_power::soil_wetness_summary))
        // soil
        .route("/soil/location", get(soil::location))
        .route("/soil/infiltration/rate", get(soil::infiltration_rates))
        .route("/soil/permeability/rates", get(soil::permeability_rates))
        .route("/soil/water-holding/capacity", get(soil::water_holding_capacity))
}

pub(crate) fn check_coordinates(lat: f64, lon: f64) -> ApiResult<()> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::BadRequest(format!("latitude must be between -90 and 90 (got {lat})")));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::BadRequest(format!(
            "longitude must be between -180 and 180 (got {lon})"
        )));
    }
    Ok(())
}
