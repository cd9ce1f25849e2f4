// src/engine/mod.rs

//! Design engine for rooftop rainwater harvesting and artificial recharge.
//!
//! A linear pipeline: runoff → structure selection → dimensioning → costing →
//! benefit/payback. Everything here is pure and synchronous; environmental
//! context is resolved by the caller and passed in as plain values.

mod cost;
mod runoff;
mod structure;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cost::{
    estimate_benefit, estimate_costs, payback_years, recharge_potential, CostBenefit,
    OPEX_FRACTION, RECHARGE_CYCLES_PER_YEAR,
};
pub use runoff::{estimate_runoff, DEFAULT_RUNOFF_COEFFICIENT};
pub use structure::{
    select_structure, suggest_dimensions, Dimensions, Planform, StructureDesign, StructureSpec,
    StructureType,
};

/// Fraction of the annual runoff the structure is sized to hold.
pub const DEFAULT_DESIGN_STORAGE_FRACTION: f64 = 0.25;
/// Notional water price used for payback, currency units per kiloliter.
pub const DEFAULT_WATER_PRICE_PER_KL: f64 = 1.0;

pub const FALLBACK_ANNUAL_RAINFALL_MM: f64 = 800.0;
pub const FALLBACK_GW_DEPTH_M: f64 = 8.0;
pub const FALLBACK_TRANSMISSIVITY_M2_PER_DAY: f64 = 500.0;
pub const FALLBACK_STORATIVITY: f64 = 0.12;
pub const FALLBACK_AQUIFER_TYPE: &str = "Alluvial/Unconfined";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// ───────────────────────────────────────
// Inputs
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteInput {
    pub latitude: f64,
    pub longitude: f64,
    pub roof_area_m2: f64,
    pub open_space_area_m2: f64,
    pub occupants: u32,
    /// Overrides the rule-based selector when set.
    pub preferred_structure: Option<StructureType>,
}

impl SiteInput {
    pub fn validate(&self) -> Result<(), EngineError> {
        in_range("latitude", self.latitude, -90.0, 90.0)?;
        in_range("longitude", self.longitude, -180.0, 180.0)?;
        non_negative("roof_area_m2", self.roof_area_m2)?;
        non_negative("open_space_area_m2", self.open_space_area_m2)?;
        Ok(())
    }
}

/// Rainfall and aquifer context for a site, snapshotted into every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalContext {
    pub annual_rainfall_mm: f64,
    pub gw_depth_m: f64,
    pub aquifer_type: String,
    pub transmissivity_m2_per_day: f64,
    pub storativity: f64,
}

impl Default for EnvironmentalContext {
    fn default() -> Self {
        Self {
            annual_rainfall_mm: FALLBACK_ANNUAL_RAINFALL_MM,
            gw_depth_m: FALLBACK_GW_DEPTH_M,
            aquifer_type: FALLBACK_AQUIFER_TYPE.to_string(),
            transmissivity_m2_per_day: FALLBACK_TRANSMISSIVITY_M2_PER_DAY,
            storativity: FALLBACK_STORATIVITY,
        }
    }
}

impl EnvironmentalContext {
    pub fn validate(&self) -> Result<(), EngineError> {
        non_negative("annual_rainfall_mm", self.annual_rainfall_mm)?;
        non_negative("gw_depth_m", self.gw_depth_m)?;
        non_negative("transmissivity_m2_per_day", self.transmissivity_m2_per_day)?;
        in_range("storativity", self.storativity, 0.0, 1.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    pub runoff_coefficient: f64,
    pub design_storage_fraction: f64,
    pub water_price_per_kl: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            runoff_coefficient: DEFAULT_RUNOFF_COEFFICIENT,
            design_storage_fraction: DEFAULT_DESIGN_STORAGE_FRACTION,
            water_price_per_kl: DEFAULT_WATER_PRICE_PER_KL,
        }
    }
}

// ───────────────────────────────────────
// Outputs
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunoffResult {
    pub annual_rainfall_mm: f64,
    pub runoff_coefficient: f64,
    pub annual_runoff_volume_liters: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecommendation {
    pub runoff: RunoffResult,
    pub structure: StructureDesign,
    pub cost: CostBenefit,
    pub aquifer: EnvironmentalContext,
    pub recharge_potential_liters: f64,
}

/// Run the full pipeline with default engine parameters.
pub fn compute_recommendation(
    site: &SiteInput,
    context: &EnvironmentalContext,
) -> Result<DesignRecommendation, EngineError> {
    compute_recommendation_with(site, context, &EngineParams::default())
}

pub fn compute_recommendation_with(
    site: &SiteInput,
    context: &EnvironmentalContext,
    params: &EngineParams,
) -> Result<DesignRecommendation, EngineError> {
    site.validate()?;
    context.validate()?;

    let runoff_liters = estimate_runoff(
        context.annual_rainfall_mm,
        site.roof_area_m2,
        params.runoff_coefficient,
    );
    finite_output("annual_runoff_volume_liters", runoff_liters)?;

    let structure_type = site.preferred_structure.unwrap_or_else(|| {
        select_structure(site.roof_area_m2, site.open_space_area_m2, context.gw_depth_m)
    });
    let structure = suggest_dimensions(
        structure_type,
        runoff_liters * params.design_storage_fraction,
    );
    finite_output("depth_m", structure.dimensions.depth_m())?;
    finite_output("storage_volume_liters", structure.effective_storage_liters)?;

    let (capex, opex) = estimate_costs(structure_type, structure.effective_storage_liters);
    let benefit = estimate_benefit(runoff_liters);
    let payback = payback_years(capex, benefit, params.water_price_per_kl);
    let recharge = recharge_potential(runoff_liters, structure.effective_storage_liters);
    for (field, value) in [
        ("capex_currency", capex),
        ("opex_currency_per_year", opex),
        ("water_savings_liters_per_year", benefit),
        ("payback_years", payback),
        ("recharge_potential_liters", recharge),
    ] {
        finite_output(field, value)?;
    }

    Ok(DesignRecommendation {
        runoff: RunoffResult {
            annual_rainfall_mm: context.annual_rainfall_mm,
            runoff_coefficient: params.runoff_coefficient,
            annual_runoff_volume_liters: runoff_liters,
        },
        structure,
        cost: CostBenefit {
            capex_currency: capex,
            opex_currency_per_year: opex,
            water_savings_liters_per_year: benefit,
            payback_years: payback,
        },
        aquifer: context.clone(),
        recharge_potential_liters: recharge,
    })
}

fn non_negative(field: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "{field} must be a finite non-negative number (got {value})"
        )));
    }
    Ok(())
}

/// Inputs that pass validation can still overflow once multiplied through.
fn finite_output(field: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() {
        return Err(EngineError::InvalidInput(format!(
            "inputs too large: {field} is not a finite number"
        )));
    }
    Ok(())
}

fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < min || value > max {
        return Err(EngineError::InvalidInput(format!(
            "{field} must be between {min} and {max} (got {value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(roof: f64, open: f64) -> SiteInput {
        SiteInput {
            latitude: 12.97,
            longitude: 77.59,
            roof_area_m2: roof,
            open_space_area_m2: open,
            occupants: 4,
            preferred_structure: None,
        }
    }

    fn context(rain_mm: f64, gw_depth_m: f64) -> EnvironmentalContext {
        EnvironmentalContext {
            annual_rainfall_mm: rain_mm,
            gw_depth_m,
            ..EnvironmentalContext::default()
        }
    }

    #[test]
    fn small_roof_scenario() {
        let rec = compute_recommendation(&site(100.0, 10.0), &context(800.0, 8.0)).unwrap();

        assert!((rec.runoff.annual_runoff_volume_liters - 68_000.0).abs() < 1e-6);
        assert_eq!(rec.runoff.runoff_coefficient, 0.85);
        assert_eq!(rec.structure.structure_type, StructureType::Pit);
        assert_eq!(rec.structure.dimensions.depth_m(), 18.89);

        let storage = rec.structure.effective_storage_liters;
        assert!((storage - 17_001.0).abs() < 1e-6);
        assert!((rec.cost.capex_currency - (20_000.0 + 3.0 * storage / 1000.0)).abs() < 1e-9);
        assert!((rec.cost.opex_currency_per_year - 0.02 * rec.cost.capex_currency).abs() < 1e-9);
        assert_eq!(rec.cost.water_savings_liters_per_year, rec.runoff.annual_runoff_volume_liters);
        assert!((rec.cost.payback_years - rec.cost.capex_currency / 68.0).abs() < 1e-9);
        assert_eq!(rec.recharge_potential_liters, rec.runoff.annual_runoff_volume_liters);
    }

    #[test]
    fn preferred_structure_overrides_selector() {
        let mut s = site(100.0, 10.0);
        s.preferred_structure = Some(StructureType::RechargeWell);
        let rec = compute_recommendation(&s, &context(800.0, 8.0)).unwrap();
        assert_eq!(rec.structure.structure_type, StructureType::RechargeWell);
        assert!(matches!(rec.structure.dimensions, Dimensions::Circular { .. }));
    }

    #[test]
    fn zero_roof_floors_every_stage() {
        let rec = compute_recommendation(&site(0.0, 0.0), &context(800.0, 8.0)).unwrap();
        assert_eq!(rec.runoff.annual_runoff_volume_liters, 0.0);
        assert_eq!(rec.structure.dimensions.depth_m(), 1.2);
        assert_eq!(rec.recharge_potential_liters, 0.0);
        assert_eq!(rec.cost.payback_years, rec.cost.capex_currency);
    }

    #[test]
    fn recharge_never_exceeds_bounds() {
        for (roof, rain) in [(50.0, 300.0), (150.0, 1200.0), (400.0, 2500.0), (1000.0, 90.0)] {
            for gw in [2.0, 8.0, 15.0] {
                let rec = compute_recommendation(&site(roof, 30.0), &context(rain, gw)).unwrap();
                assert!(rec.recharge_potential_liters <= rec.runoff.annual_runoff_volume_liters);
                assert!(rec.recharge_potential_liters <= rec.structure.effective_storage_liters * 12.0);
                assert!(rec.cost.capex_currency >= 0.0);
            }
        }
    }

    #[test]
    fn identical_inputs_serialize_identically() {
        let s = site(240.0, 12.0);
        let c = context(1100.0, 11.0);
        let a = serde_json::to_vec(&compute_recommendation(&s, &c).unwrap()).unwrap();
        let b = serde_json::to_vec(&compute_recommendation(&s, &c).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn custom_params_flow_through() {
        let params = EngineParams {
            runoff_coefficient: 0.7,
            design_storage_fraction: 0.5,
            water_price_per_kl: 10.0,
        };
        let rec = compute_recommendation_with(&site(100.0, 0.0), &context(1000.0, 8.0), &params).unwrap();
        assert!((rec.runoff.annual_runoff_volume_liters - 70_000.0).abs() < 1e-6);
        assert!((rec.cost.payback_years - rec.cost.capex_currency / 700.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_negative_and_out_of_range_input() {
        let mut s = site(-1.0, 0.0);
        assert!(matches!(
            compute_recommendation(&s, &context(800.0, 8.0)),
            Err(EngineError::InvalidInput(msg)) if msg.contains("roof_area_m2")
        ));

        s = site(10.0, f64::NAN);
        assert!(compute_recommendation(&s, &context(800.0, 8.0)).is_err());

        s = site(10.0, 0.0);
        s.latitude = 91.0;
        assert!(compute_recommendation(&s, &context(800.0, 8.0)).is_err());

        let mut c = context(800.0, 8.0);
        c.storativity = 1.5;
        assert!(compute_recommendation(&site(10.0, 0.0), &c).is_err());
    }

    #[test]
    fn rejects_inputs_that_overflow() {
        for roof in [1e306, f64::MAX] {
            assert!(matches!(
                compute_recommendation(&site(roof, 0.0), &context(800.0, 8.0)),
                Err(EngineError::InvalidInput(msg)) if msg.contains("not a finite number")
            ));
        }
        assert!(compute_recommendation(&site(10.0, 0.0), &context(f64::MAX, 8.0)).is_err());
        assert!(compute_recommendation(&site(1e6, 0.0), &context(1e5, 8.0)).is_ok());
    }

    #[test]
    fn snapshot_field_names() {
        let rec = compute_recommendation(&site(350.0, 5.0), &context(900.0, 12.0)).unwrap();
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["structure"]["structure_type"], "recharge_well");
        assert!(json["structure"]["storage_volume_liters"].is_number());
        assert!(json["cost"]["capex_currency"].is_number());
        assert_eq!(json["aquifer"]["aquifer_type"], FALLBACK_AQUIFER_TYPE);

        let back: DesignRecommendation = serde_json::from_value(json).unwrap();
        assert_eq!(back.structure.structure_type, rec.structure.structure_type);
        assert_eq!(back.aquifer.aquifer_type, rec.aquifer.aquifer_type);
    }
}
