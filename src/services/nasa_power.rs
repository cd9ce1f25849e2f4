// src/services/nasa_power.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// POWER marks missing values with -999.
const FILL_VALUE: f64 = -999.0;

/// Upper bound of a light rain day (mm); above it and up to the heavy
/// threshold is moderate.
const LIGHT_RAIN_MAX_MM: f64 = 5.0;
const HEAVY_RAIN_ABOVE_MM: f64 = 15.0;
const HOT_DAY_ABOVE_C: f64 = 30.0;
const COLD_DAY_BELOW_C: f64 = 15.0;
/// Surface soil wetness band considered optimal for recharge.
const SOIL_DRY_BELOW: f64 = 0.3;
const SOIL_SATURATED_ABOVE: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerDay {
    pub date: NaiveDate,
    /// °C at 2 m
    pub temperature_2m: f64,
    /// mm/day, bias-corrected
    pub precipitation: f64,
    /// surface soil wetness, 0..1
    pub soil_wetness: f64,
}

// ───────────────────────────────────────
// Summaries
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationSummary {
    pub total_precipitation_mm: f64,
    pub average_daily_precipitation_mm: f64,
    pub max_daily_precipitation_mm: f64,
    /// days with any measurable rain
    pub rainy_days: usize,
    pub precipitation_frequency_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationPatterns {
    pub light_rain_days: usize,
    pub moderate_rain_days: usize,
    pub heavy_rain_days: usize,
    pub dry_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationAnalysis {
    pub precipitation_summary: PrecipitationSummary,
    pub precipitation_patterns: PrecipitationPatterns,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub average_temperature_c: f64,
    pub max_temperature_c: f64,
    pub min_temperature_c: f64,
    pub temperature_range_c: f64,
    pub temperature_variability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureTrends {
    pub hot_days: usize,
    pub cold_days: usize,
    pub comfortable_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureAnalysis {
    pub temperature_summary: TemperatureSummary,
    pub temperature_trends: TemperatureTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilWetnessSummary {
    pub average_soil_wetness: f64,
    pub max_soil_wetness: f64,
    pub min_soil_wetness: f64,
    pub soil_wetness_variability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilConditions {
    pub dry_days: usize,
    pub optimal_days: usize,
    pub saturated_days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallCondition {
    Good,
    NeedsAttention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DroughtRisk {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilHealthAssessment {
    pub overall_condition: OverallCondition,
    pub drought_risk: DroughtRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilWetnessAnalysis {
    pub soil_wetness_summary: SoilWetnessSummary,
    pub soil_conditions: SoilConditions,
    pub soil_health_assessment: SoilHealthAssessment,
}

#[async_trait]
pub trait NasaPowerProvider: Send + Sync {
    async fn daily(&self, lat: f64, lon: f64, start: NaiveDate, end: NaiveDate) -> Vec<PowerDay>;

    fn source(&self) -> &'static str;
}

#[derive(Debug, Default, Clone)]
pub struct StubNasaPowerProvider;

#[async_trait]
impl NasaPowerProvider for StubNasaPowerProvider {
    async fn daily(&self, lat: f64, _lon: f64, start: NaiveDate, end: NaiveDate) -> Vec<PowerDay> {
        mock_daily(lat, start, end)
    }

    fn source(&self) -> &'static str {
        "mock"
    }
}

/// Seasonal synthetic series: temperature follows latitude and month,
/// rain falls only in the June–September monsoon.
pub fn mock_daily(lat: f64, start: NaiveDate, end: NaiveDate) -> Vec<PowerDay> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let month = f64::from(date.month());
            let day = date.day();
            let temperature = 20.0 + lat * 0.1 + 10.0 * (month - 6.0) / 6.0 + (f64::from(day % 10) - 5.0);
            let precipitation = if (6..=9).contains(&date.month()) {
                f64::from(day % 7) * 2.5
            } else {
                0.0
            };
            PowerDay {
                date,
                temperature_2m: temperature,
                precipitation,
                soil_wetness: (precipitation / 10.0 + 0.3).min(1.0),
            }
        })
        .collect()
}

struct Spread {
    total: f64,
    mean: f64,
    max: f64,
    min: f64,
}

fn spread(values: &[f64]) -> Option<Spread> {
    if values.is_empty() {
        return None;
    }
    let total: f64 = values.iter().sum();
    Some(Spread {
        total,
        mean: total / values.len() as f64,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn count(values: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    values.iter().filter(|v| pred(**v)).count()
}

/// `None` for an empty series.
pub fn summarize_precipitation(days: &[PowerDay]) -> Option<PrecipitationAnalysis> {
    let values: Vec<f64> = days.iter().map(|d| d.precipitation).collect();
    let s = spread(&values)?;
    let rainy_days = count(&values, |p| p > 0.0);
    Some(PrecipitationAnalysis {
        precipitation_summary: PrecipitationSummary {
            total_precipitation_mm: round_to(s.total, 2),
            average_daily_precipitation_mm: round_to(s.mean, 2),
            max_daily_precipitation_mm: round_to(s.max, 2),
            rainy_days,
            precipitation_frequency_percent: round_to(rainy_days as f64 / values.len() as f64 * 100.0, 1),
        },
        precipitation_patterns: PrecipitationPatterns {
            light_rain_days: count(&values, |p| p > 0.0 && p <= LIGHT_RAIN_MAX_MM),
            moderate_rain_days: count(&values, |p| p > LIGHT_RAIN_MAX_MM && p <= HEAVY_RAIN_ABOVE_MM),
            heavy_rain_days: count(&values, |p| p > HEAVY_RAIN_ABOVE_MM),
            dry_days: count(&values, |p| p == 0.0),
        },
    })
}

pub fn summarize_temperature(days: &[PowerDay]) -> Option<TemperatureAnalysis> {
    let values: Vec<f64> = days.iter().map(|d| d.temperature_2m).collect();
    let s = spread(&values)?;
    let range = round_to(s.max - s.min, 1);
    Some(TemperatureAnalysis {
        temperature_summary: TemperatureSummary {
            average_temperature_c: round_to(s.mean, 1),
            max_temperature_c: round_to(s.max, 1),
            min_temperature_c: round_to(s.min, 1),
            temperature_range_c: range,
            temperature_variability: range,
        },
        temperature_trends: TemperatureTrends {
            hot_days: count(&values, |t| t > HOT_DAY_ABOVE_C),
            cold_days: count(&values, |t| t < COLD_DAY_BELOW_C),
            comfortable_days: count(&values, |t| (COLD_DAY_BELOW_C..=HOT_DAY_ABOVE_C).contains(&t)),
        },
    })
}

pub fn summarize_soil_wetness(days: &[PowerDay]) -> Option<SoilWetnessAnalysis> {
    let values: Vec<f64> = days.iter().map(|d| d.soil_wetness).collect();
    let s = spread(&values)?;

    let overall_condition = if (SOIL_DRY_BELOW..=SOIL_SATURATED_ABOVE).contains(&s.mean) {
        OverallCondition::Good
    } else {
        OverallCondition::NeedsAttention
    };
    let drought_risk = match s.mean {
        m if m > 0.4 => DroughtRisk::Low,
        m if m > 0.2 => DroughtRisk::Moderate,
        _ => DroughtRisk::High,
    };

    Some(SoilWetnessAnalysis {
        soil_wetness_summary: SoilWetnessSummary {
            average_soil_wetness: round_to(s.mean, 3),
            max_soil_wetness: round_to(s.max, 3),
            min_soil_wetness: round_to(s.min, 3),
            soil_wetness_variability: round_to(s.max - s.min, 3),
        },
        soil_conditions: SoilConditions {
            dry_days: count(&values, |w| w < SOIL_DRY_BELOW),
            optimal_days: count(&values, |w| (SOIL_DRY_BELOW..=SOIL_SATURATED_ABOVE).contains(&w)),
            saturated_days: count(&values, |w| w > SOIL_SATURATED_ABOVE),
        },
        soil_health_assessment: SoilHealthAssessment { overall_condition, drought_risk },
    })
}

pub struct LiveNasaPowerProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PowerResponse {
    properties: PowerProperties,
}

#[derive(Deserialize)]
struct PowerProperties {
    parameter: HashMap<String, BTreeMap<String, f64>>,
}

impl LiveNasaPowerProvider {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PowerResponse, reqwest::Error> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("parameters", "T2M,PRECTOTCORR,GWETTOP".to_string()),
                ("community", "AG".to_string()),
                ("longitude", lon.to_string()),
                ("latitude", lat.to_string()),
                ("start", start.format("%Y%m%d").to_string()),
                ("end", end.format("%Y%m%d").to_string()),
                ("format", "JSON".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn parse_days(parameter: &HashMap<String, BTreeMap<String, f64>>) -> Vec<PowerDay> {
    let value = |name: &str, key: &str| {
        parameter
            .get(name)
            .and_then(|series| series.get(key))
            .copied()
            .filter(|v| *v > FILL_VALUE)
            .unwrap_or(0.0)
    };
    let Some(dates) = parameter.get("PRECTOTCORR").or_else(|| parameter.values().next()) else {
        return Vec::new();
    };
    dates
        .keys()
        .filter_map(|key| {
            let date = NaiveDate::parse_from_str(key, "%Y%m%d").ok()?;
            Some(PowerDay {
                date,
                temperature_2m: value("T2M", key),
                precipitation: value("PRECTOTCORR", key),
                soil_wetness: value("GWETTOP", key),
            })
        })
        .collect()
}

#[async_trait]
impl NasaPowerProvider for LiveNasaPowerProvider {
    async fn daily(&self, lat: f64, lon: f64, start: NaiveDate, end: NaiveDate) -> Vec<PowerDay> {
        match self.fetch(lat, lon, start, end).await {
            Ok(resp) => parse_days(&resp.properties.parameter),
            Err(e) => {
                warn!(lat, lon, "NASA POWER request failed, using mock data: {e}");
                mock_daily(lat, start, end)
            }
        }
    }

    fn source(&self) -> &'static str {
        "nasa_power"
    }
}
