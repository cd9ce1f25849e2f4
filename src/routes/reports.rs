// src/routes/reports.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use tracing::{info, warn};

use super::assessments::load_visible;
use crate::{
    auth::MaybeUser,
    error::{internal_error, ApiError, ApiResult},
    services::{
        chat::{ChatError, ChatRequest},
        report::{self, Section},
    },
    AppState,
};

fn pdf_response(filename: String, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={filename}")),
        ],
        bytes,
    )
}

fn render(title: &str, sections: &[Section]) -> ApiResult<Vec<u8>> {
    report::render_pdf(title, sections).map_err(internal_error)
}

/// `GET /reports/<id>.pdf`
pub async fn standard_pdf(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(file): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = file
        .strip_suffix(".pdf")
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ApiError::NotFound("Report not found".into()))?;
    let a = load_visible(&state, &caller, id).await?;

    let bytes = render(&format!("Assessment #{id}"), &report::standard_report(&a))?;
    info!(id, size = bytes.len(), "report rendered");
    Ok(pdf_response(format!("assessment_{id}.pdf"), bytes))
}

pub async fn ai_pdf(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let a = load_visible(&state, &caller, id).await?;
    if state.chat.model().is_none() {
        return Err(ApiError::BadRequest("OpenAI not configured".into()));
    }

    let prompt = report::commentary_prompt(&a);
    let req = ChatRequest {
        system: report::COMMENTARY_SYSTEM_PROMPT,
        user: &prompt,
        temperature: 0.4,
        max_tokens: 300,
    };
    let commentary = match state.chat.complete(req).await {
        Ok(text) => text,
        Err(ChatError::QuotaExceeded) => report::COMMENTARY_QUOTA_TEXT.to_string(),
        Err(e) => {
            warn!(id, "AI commentary failed: {e}");
            report::COMMENTARY_FAILED_TEXT.to_string()
        }
    };

    let bytes = render(&format!("Assessment #{id}"), &report::commentary_report(&a, &commentary))?;
    Ok(pdf_response(format!("assessment_{id}_ai.pdf"), bytes))
}

pub async fn guide_pdf(
    State(state): State<AppState>,
    caller: MaybeUser,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let a = load_visible(&state, &caller, id).await?;

    let (steps, notice) = if !report::is_feasible(&a) {
        (None, None)
    } else if state.chat.model().is_none() {
        (None, Some(report::GUIDE_NOT_CONFIGURED_TEXT))
    } else {
        let prompt = report::guide_prompt(&a);
        let req = ChatRequest {
            system: report::GUIDE_SYSTEM_PROMPT,
            user: &prompt,
            temperature: 0.3,
            max_tokens: 600,
        };
        match state.chat.complete(req).await {
            Ok(text) => (Some(text), None),
            Err(ChatError::QuotaExceeded) => (None, Some(report::GUIDE_QUOTA_TEXT)),
            Err(e) => {
                warn!(id, "AI guide steps failed: {e}");
                (None, Some(report::GUIDE_FAILED_TEXT))
            }
        }
    };

    let sections = report::guide_report(&a, steps.as_deref(), notice);
    let bytes = render(&format!("Implementation guide: assessment #{id}"), &sections)?;
    Ok(pdf_response(format!("assessment_{id}_guide.pdf"), bytes))
}
