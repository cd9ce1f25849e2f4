// src/routes/nasa_power.rs

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{check_coordinates, weather::Location};
use crate::{
    error::{ApiError, ApiResult},
    services::nasa_power::{
        summarize_precipitation, summarize_soil_wetness, summarize_temperature, PowerDay,
        PrecipitationAnalysis, SoilWetnessAnalysis, TemperatureAnalysis,
    },
    AppState,
};

const DEFAULT_SPAN_DAYS: i64 = 30;
const MAX_SPAN_DAYS: i64 = 366;
const MAX_DAYS_BACK: i64 = 365;

#[derive(Deserialize)]
pub struct DataQ {
    pub latitude: f64,
    pub longitude: f64,
    /// YYYY-MM-DD
    pub start: Option<String>,
    /// YYYY-MM-DD
    pub end: Option<String>,
}

#[derive(Deserialize)]
pub struct SummaryQ {
    pub latitude: f64,
    pub longitude: f64,
    pub days_back: Option<i64>,
}

#[derive(Serialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Serialize)]
pub struct DataResp {
    pub location: Location,
    pub data: Vec<PowerDay>,
    pub total_records: usize,
    pub date_range: DateRange,
    pub source: &'static str,
    pub generated_at: DateTime<Utc>,
}

/// Shared envelope of the `*/summary` endpoints; `analysis` is flattened in.
#[derive(Serialize)]
pub struct SummaryResp<T> {
    pub location: Location,
    pub analysis_period_days: i64,
    #[serde(flatten)]
    pub analysis: T,
    pub source: &'static str,
    pub generated_at: DateTime<Utc>,
}

fn parse_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{field} must be YYYY-MM-DD (got '{raw}')")))
}

/// Resolve the requested window: `end` defaults to today, `start` to 30 days
/// before `end`.
pub(crate) fn date_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> ApiResult<(NaiveDate, NaiveDate)> {
    let end = end.map(|e| parse_date("end", e)).transpose()?.unwrap_or(today);
    let start = start
        .map(|s| parse_date("start", s))
        .transpose()?
        .unwrap_or(end - Duration::days(DEFAULT_SPAN_DAYS));
    if start > end {
        return Err(ApiError::BadRequest("start must not be after end".into()));
    }
    if (end - start).num_days() > MAX_SPAN_DAYS {
        return Err(ApiError::BadRequest(format!("date range must not exceed {MAX_SPAN_DAYS} days")));
    }
    Ok((start, end))
}

pub async fn data(State(state): State<AppState>, Query(q): Query<DataQ>) -> ApiResult<Json<DataResp>> {
    check_coordinates(q.latitude, q.longitude)?;
    let (start, end) = date_window(q.start.as_deref(), q.end.as_deref(), Utc::now().date_naive())?;

    let data = state.nasa_power.daily(q.latitude, q.longitude, start, end).await;
    Ok(Json(DataResp {
        location: Location { latitude: q.latitude, longitude: q.longitude },
        total_records: data.len(),
        data,
        date_range: DateRange { start_date: start, end_date: end },
        source: state.nasa_power.source(),
        generated_at: Utc::now(),
    }))
}

/// Fetch the trailing `days_back` window and summarize it; an empty series
/// is a 404 with `missing` as the detail.
async fn summarize<T>(
    state: &AppState,
    q: &SummaryQ,
    missing: &str,
    analyze: fn(&[PowerDay]) -> Option<T>,
) -> ApiResult<SummaryResp<T>> {
    check_coordinates(q.latitude, q.longitude)?;
    let days_back = q.days_back.unwrap_or(DEFAULT_SPAN_DAYS);
    if !(1..=MAX_DAYS_BACK).contains(&days_back) {
        return Err(ApiError::BadRequest(format!("days_back must be between 1 and {MAX_DAYS_BACK}")));
    }

    let end = Utc::now().date_naive();
    let start = end - Duration::days(days_back);
    let days = state.nasa_power.daily(q.latitude, q.longitude, start, end).await;
    let analysis = analyze(&days).ok_or_else(|| ApiError::NotFound(missing.to_string()))?;

    Ok(SummaryResp {
        location: Location { latitude: q.latitude, longitude: q.longitude },
        analysis_period_days: days_back,
        analysis,
        source: state.nasa_power.source(),
        generated_at: Utc::now(),
    })
}

pub async fn precipitation_summary(
    State(state): State<AppState>,
    Query(q): Query<SummaryQ>,
) -> ApiResult<Json<SummaryResp<PrecipitationAnalysis>>> {
    summarize(&state, &q, "No precipitation data available", summarize_precipitation)
        .await
        .map(Json)
}

pub async fn temperature_summary(
    State(state): State<AppState>,
    Query(q): Query<SummaryQ>,
) -> ApiResult<Json<SummaryResp<TemperatureAnalysis>>> {
    summarize(&state, &q, "No temperature data available", summarize_temperature)
        .await
        .map(Json)
}

pub async fn soil_wetness_summary(
    State(state): State<AppState>,
    Query(q): Query<SummaryQ>,
) -> ApiResult<Json<SummaryResp<SoilWetnessAnalysis>>> {
    summarize(&state, &q, "No soil wetness data available", summarize_soil_wetness)
        .await
        .map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 31).unwrap()
    }

    #[test]
    fn default_window_is_thirty_days() {
        let (start, end) = date_window(None, None, today()).unwrap();
        assert_eq!(end, today());
        assert_eq!((end - start).num_days(), 30);
    }

    #[test]
    fn explicit_window() {
        let (start, end) = date_window(Some("2024-01-01"), Some("2024-12-31"), today()).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!((end - start).num_days(), 365);
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(date_window(Some("2024-02-01"), Some("2024-01-01"), today()).is_err());
        assert!(date_window(Some("2022-01-01"), Some("2024-01-01"), today()).is_err());
        assert!(date_window(Some("01/02/2024"), None, today()).is_err());
    }
}
