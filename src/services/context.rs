// src/services/context.rs

//! Rainfall and aquifer context for a coordinate.
//!
//! Providers never fail: any upstream error degrades to the conservative
//! fallback constants so an assessment can always be computed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Postgres};
use tracing::{debug, warn};

use crate::engine::{
    EnvironmentalContext, FALLBACK_ANNUAL_RAINFALL_MM, FALLBACK_AQUIFER_TYPE, FALLBACK_GW_DEPTH_M,
    FALLBACK_STORATIVITY, FALLBACK_TRANSMISSIVITY_M2_PER_DAY,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundwaterContext {
    pub gw_depth_m: f64,
    pub aquifer_type: String,
    pub transmissivity_m2_per_day: f64,
    pub storativity: f64,
}

impl Default for GroundwaterContext {
    fn default() -> Self {
        Self {
            gw_depth_m: FALLBACK_GW_DEPTH_M,
            aquifer_type: FALLBACK_AQUIFER_TYPE.to_string(),
            transmissivity_m2_per_day: FALLBACK_TRANSMISSIVITY_M2_PER_DAY,
            storativity: FALLBACK_STORATIVITY,
        }
    }
}

#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn annual_rainfall_mm(&self, lat: f64, lon: f64) -> f64;

    async fn groundwater_context(&self, lat: f64, lon: f64) -> GroundwaterContext;

    async fn environmental_context(&self, lat: f64, lon: f64) -> EnvironmentalContext {
        let (annual_rainfall_mm, gw) = tokio::join!(
            self.annual_rainfall_mm(lat, lon),
            self.groundwater_context(lat, lon)
        );
        EnvironmentalContext {
            annual_rainfall_mm,
            gw_depth_m: gw.gw_depth_m,
            aquifer_type: gw.aquifer_type,
            transmissivity_m2_per_day: gw.transmissivity_m2_per_day,
            storativity: gw.storativity,
        }
    }
}

/// Deterministic provider returning the fallback constants.
#[derive(Debug, Default, Clone)]
pub struct StubContextProvider;

#[async_trait]
impl ContextProvider for StubContextProvider {
    async fn annual_rainfall_mm(&self, _lat: f64, _lon: f64) -> f64 {
        FALLBACK_ANNUAL_RAINFALL_MM
    }

    async fn groundwater_context(&self, _lat: f64, _lon: f64) -> GroundwaterContext {
        GroundwaterContext::default()
    }
}

/// Climatology from the Open-Meteo climate API, aquifer data from PostGIS
/// tables when a database is configured.
pub struct LiveContextProvider {
    client: reqwest::Client,
    climate_api_url: String,
    pool: Option<Pool<Postgres>>,
}

// Types to deserialize the climate API response
#[derive(Deserialize)]
struct ClimateResponse {
    #[serde(default)]
    monthly: Option<ClimateMonthly>,
}

#[derive(Deserialize)]
struct ClimateMonthly {
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl LiveContextProvider {
    pub fn new(client: reqwest::Client, climate_api_url: String, pool: Option<Pool<Postgres>>) -> Self {
        Self { client, climate_api_url, pool }
    }

    async fn fetch_climatology(&self, lat: f64, lon: f64) -> Result<ClimateResponse, reqwest::Error> {
        self.client
            .get(&self.climate_api_url)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                ("start_year", "1991".to_string()),
                ("end_year", "2020".to_string()),
                ("monthly", "precipitation_sum".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// Sum twelve monthly climatology values into an annual depth, falling back
/// when the series is empty or non-positive.
pub fn annual_from_monthly(series: &[Option<f64>]) -> f64 {
    let annual: f64 = series.iter().flatten().filter(|v| v.is_finite()).sum();
    if annual > 0.0 {
        annual
    } else {
        FALLBACK_ANNUAL_RAINFALL_MM
    }
}

#[async_trait]
impl ContextProvider for LiveContextProvider {
    async fn annual_rainfall_mm(&self, lat: f64, lon: f64) -> f64 {
        match self.fetch_climatology(lat, lon).await {
            Ok(resp) => {
                let series = resp.monthly.map(|m| m.precipitation_sum).unwrap_or_default();
                let annual = annual_from_monthly(&series);
                debug!(lat, lon, annual, "climatology rainfall");
                annual
            }
            Err(e) => {
                warn!(lat, lon, "climate API failed, using fallback rainfall: {e}");
                FALLBACK_ANNUAL_RAINFALL_MM
            }
        }
    }

    async fn groundwater_context(&self, lat: f64, lon: f64) -> GroundwaterContext {
        let mut ctx = GroundwaterContext::default();
        let Some(pool) = &self.pool else {
            return ctx;
        };

        let aquifer = sqlx::query_as::<_, (String, f64, f64)>(
            r#"
            SELECT aquifer_type, transmissivity_m2_per_day, storativity
            FROM aquifer_data
            WHERE ST_Intersects(geom, ST_SetSRID(ST_Point($1, $2), 4326))
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .fetch_optional(pool)
        .await;
        match aquifer {
            Ok(Some((aquifer_type, transmissivity, storativity)))
                if usable_aquifer(transmissivity, storativity) =>
            {
                ctx.aquifer_type = aquifer_type;
                ctx.transmissivity_m2_per_day = transmissivity;
                ctx.storativity = storativity;
            }
            Ok(Some((aquifer_type, transmissivity, storativity))) => warn!(
                lat,
                lon,
                aquifer_type = %aquifer_type,
                transmissivity,
                storativity,
                "aquifer row out of range, using fallback"
            ),
            Ok(None) => debug!(lat, lon, "no aquifer polygon at point"),
            Err(e) => warn!(lat, lon, "aquifer lookup failed, using fallback: {e}"),
        }

        let depth = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT depth_m
            FROM gw_depth_points
            ORDER BY geom <-> ST_SetSRID(ST_Point($1, $2), 4326)
            LIMIT 1
            "#,
        )
        .bind(lon)
        .bind(lat)
        .fetch_optional(pool)
        .await;
        match depth {
            Ok(Some(d)) if d.is_finite() && d >= 0.0 => ctx.gw_depth_m = d,
            Ok(_) => debug!(lat, lon, "no usable groundwater depth observation"),
            Err(e) => warn!(lat, lon, "groundwater depth lookup failed, using fallback: {e}"),
        }

        ctx
    }
}

/// Stored aquifer parameters must be physical before they reach the engine.
fn usable_aquifer(transmissivity_m2_per_day: f64, storativity: f64) -> bool {
    transmissivity_m2_per_day.is_finite()
        && transmissivity_m2_per_day >= 0.0
        && (0.0..=1.0).contains(&storativity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_monthly_series() {
        let series = [Some(10.0), None, Some(20.5), Some(f64::NAN), Some(0.0)];
        assert_eq!(annual_from_monthly(&series), 30.5);
    }

    #[test]
    fn empty_series_falls_back() {
        assert_eq!(annual_from_monthly(&[]), FALLBACK_ANNUAL_RAINFALL_MM);
        assert_eq!(annual_from_monthly(&[Some(0.0), None]), FALLBACK_ANNUAL_RAINFALL_MM);
    }

    #[test]
    fn rejects_unphysical_aquifer_rows() {
        assert!(usable_aquifer(500.0, 0.12));
        assert!(usable_aquifer(0.0, 0.0));
        assert!(usable_aquifer(1.0, 1.0));
        assert!(!usable_aquifer(500.0, 1.5));
        assert!(!usable_aquifer(500.0, -0.1));
        assert!(!usable_aquifer(-1.0, 0.12));
        assert!(!usable_aquifer(f64::INFINITY, 0.12));
        assert!(!usable_aquifer(500.0, f64::NAN));
    }

    #[tokio::test]
    async fn stub_context_uses_fallbacks() {
        let ctx = StubContextProvider.environmental_context(12.9, 77.6).await;
        assert_eq!(ctx, EnvironmentalContext::default());
    }

    #[tokio::test]
    async fn live_without_pool_keeps_aquifer_defaults() {
        let provider = LiveContextProvider::new(reqwest::Client::new(), "http://127.0.0.1:9".into(), None);
        assert_eq!(provider.groundwater_context(0.0, 0.0).await, GroundwaterContext::default());
    }
}
