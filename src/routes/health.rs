// src/routes/health.rs

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct RootResp { pub status: &'static str, pub name: String }

#[derive(Serialize)]
pub struct HealthResp { pub status: &'static str, pub version: &'static str }

pub async fn root(State(state): State<AppState>) -> Json<RootResp> {
    Json(RootResp { status: "ok", name: state.config.app_name.clone() })
}

pub async fn health() -> Json<HealthResp> {
    Json(HealthResp { status: "ok", version: env!("CARGO_PKG_VERSION") })
}
