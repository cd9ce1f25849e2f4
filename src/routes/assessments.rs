// src/routes/assessments.rs

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

use crate::{
    auth::MaybeUser,
    engine::compute_recommendation_with,
    error::{internal_error, ApiError, ApiResult},
    models::{Assessment, AssessmentInput, AssessmentOut, NewAssessment},
    AppState,
};

/// Resolve the caller's user id; anonymous or unknown emails map to `None`.
pub(crate) async fn caller_id(state: &AppState, email: Option<&str>) -> ApiResult<Option<i64>> {
    let Some(email) = email else {
        return Ok(None);
    };
    Ok(state.store.find_user_by_email(email).await?.map(|u| u.id))
}

/// Fetch an assessment visible to the caller. Anonymous callers can read any
/// assessment; signed-in users only their own.
pub(crate) async fn load_visible(state: &AppState, caller: &MaybeUser, id: i64) -> ApiResult<Assessment> {
    let owner = caller_id(state, caller.0.as_deref()).await?;
    match state.store.get_assessment(id).await? {
        Some(a) if owner.is_none() || a.user_id == owner => Ok(a),
        _ => Err(ApiError::NotFound("Assessment not found".into())),
    }
}

pub async fn create_assessment(
    State(state): State<AppState>,
    caller: MaybeUser,
    Json(input): Json<AssessmentInput>,
) -> ApiResult<Json<AssessmentOut>> {
    let site = input.to_site_input()?;
    let user_id = caller_id(&state, caller.0.as_deref()).await?;

    let context = state.context.environmental_context(site.latitude, site.longitude).await;
    let rec = compute_recommendation_with(&site, &context, &state.config.engine)?;
    let results = serde_json::to_value(&rec).map_err(internal_error)?;

    let saved = state
        .store
        .insert_assessment(NewAssessment { user_id, input, results })
        .await?;
    info!(
        id = saved.id,
        lat = saved.latitude,
        lon = saved.longitude,
        structure = %rec.structure.structure_type,
        "assessment created"
    );
    Ok(Json(saved.into()))
}

pub async fn list_assessments(
    State(state): State<AppState>,
    caller: MaybeUser,
) -> ApiResult<Json<Vec<AssessmentOut>>> {
    let owner = caller_id(&state, caller.0.as_deref()).await?;
    let rows = state.store.list_assessments(owner).await?;
    Ok(Json(rows.into_iter().map(AssessmentOut::from).collect()))
}

pub async fn get_assessment(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<AssessmentOut>> {
    Ok(Json(load_visible(&state, &caller, id).await?.into()))
}
