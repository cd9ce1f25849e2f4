// src/engine/structure.rs

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EngineError;

// ───────────────────────────────────────
// Structure catalogue
// ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    Pit,
    Trench,
    Shaft,
    RechargeWell,
}

impl StructureType {
    pub const ALL: [StructureType; 4] = [
        StructureType::Pit,
        StructureType::Trench,
        StructureType::Shaft,
        StructureType::RechargeWell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StructureType::Pit => "pit",
            StructureType::Trench => "trench",
            StructureType::Shaft => "shaft",
            StructureType::RechargeWell => "recharge_well",
        }
    }

    /// Geometry, media and cost constants for this structure.
    pub fn spec(self) -> &'static StructureSpec {
        match self {
            StructureType::Pit => &PIT,
            StructureType::Trench => &TRENCH,
            StructureType::Shaft => &SHAFT,
            StructureType::RechargeWell => &RECHARGE_WELL,
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StructureType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StructureType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                EngineError::InvalidInput(format!(
                    "preferred_structure must be one of pit, trench, shaft, recharge_well (got '{s}')"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Planform {
    Rectangular { length_m: f64, breadth_m: f64 },
    Circular { diameter_m: f64 },
}

impl Planform {
    pub fn area_m2(&self) -> f64 {
        match *self {
            Planform::Rectangular { length_m, breadth_m } => length_m * breadth_m,
            Planform::Circular { diameter_m } => PI * (diameter_m / 2.0).powi(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureSpec {
    pub planform: Planform,
    /// Fraction of the excavated volume available to water once filled.
    pub void_ratio: f64,
    pub min_depth_m: f64,
    /// Decimal places the solved depth is reported with.
    pub depth_decimals: i32,
    pub base_cost: f64,
    pub cost_per_kl: f64,
    pub notes: &'static str,
}

const PIT: StructureSpec = StructureSpec {
    planform: Planform::Rectangular { length_m: 1.5, breadth_m: 1.5 },
    void_ratio: 0.40,
    min_depth_m: 1.2,
    depth_decimals: 2,
    base_cost: 20_000.0,
    cost_per_kl: 3.0,
    notes: "40% void ratio assumed for pebble media",
};

const TRENCH: StructureSpec = StructureSpec {
    planform: Planform::Rectangular { length_m: 6.0, breadth_m: 0.6 },
    void_ratio: 0.35,
    min_depth_m: 1.2,
    depth_decimals: 2,
    base_cost: 35_000.0,
    cost_per_kl: 2.5,
    notes: "35% void ratio assumed for brickbats",
};

const SHAFT: StructureSpec = StructureSpec {
    planform: Planform::Circular { diameter_m: 0.9 },
    void_ratio: 0.30,
    min_depth_m: 6.0,
    depth_decimals: 1,
    base_cost: 60_000.0,
    cost_per_kl: 4.0,
    notes: "30% effective storage with gravel pack",
};

const RECHARGE_WELL: StructureSpec = StructureSpec {
    planform: Planform::Circular { diameter_m: 1.0 },
    void_ratio: 1.0,
    min_depth_m: 8.0,
    depth_decimals: 1,
    base_cost: 120_000.0,
    cost_per_kl: 4.5,
    notes: "Assuming full well volume as storage",
};

// ───────────────────────────────────────
// Dimensions
// ───────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimensions {
    Rectangular { length_m: f64, breadth_m: f64, depth_m: f64 },
    Circular { diameter_m: f64, depth_m: f64 },
}

impl Dimensions {
    pub fn depth_m(&self) -> f64 {
        match *self {
            Dimensions::Rectangular { depth_m, .. } | Dimensions::Circular { depth_m, .. } => depth_m,
        }
    }

    fn with_depth(planform: Planform, depth_m: f64) -> Self {
        match planform {
            Planform::Rectangular { length_m, breadth_m } => Dimensions::Rectangular {
                length_m,
                breadth_m,
                depth_m,
            },
            Planform::Circular { diameter_m } => Dimensions::Circular { diameter_m, depth_m },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDesign {
    pub structure_type: StructureType,
    pub dimensions: Dimensions,
    #[serde(rename = "storage_volume_liters")]
    pub effective_storage_liters: f64,
    pub notes: String,
}

/// Rule-based structure choice. Rule order is significant: first match wins.
pub fn select_structure(roof_area_m2: f64, open_space_area_m2: f64, gw_depth_m: f64) -> StructureType {
    // shallow water table with room to spread recharge
    if gw_depth_m < 5.0 && open_space_area_m2 >= 20.0 {
        return StructureType::Trench;
    }
    if roof_area_m2 < 120.0 {
        return StructureType::Pit;
    }
    if roof_area_m2 >= 300.0 && gw_depth_m >= 10.0 {
        return StructureType::RechargeWell;
    }
    StructureType::Shaft
}

/// Solve the free depth so the void-adjusted volume meets `target_storage_liters`,
/// never going below the structure's minimum depth.
///
/// Effective storage is recomputed from the reported (rounded) depth so the
/// returned volume always matches the returned dimensions.
pub fn suggest_dimensions(structure_type: StructureType, target_storage_liters: f64) -> StructureDesign {
    let spec = structure_type.spec();
    let liters_per_m_depth = spec.void_ratio * spec.planform.area_m2() * 1000.0;

    let solved = spec.min_depth_m.max(target_storage_liters / liters_per_m_depth);
    let depth_m = round_to(solved, spec.depth_decimals);

    StructureDesign {
        structure_type,
        dimensions: Dimensions::with_depth(spec.planform, depth_m),
        effective_storage_liters: liters_per_m_depth * depth_m,
        notes: spec.notes.to_string(),
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_rule_order() {
        assert_eq!(select_structure(100.0, 25.0, 3.0), StructureType::Trench);
        assert_eq!(select_structure(100.0, 5.0, 15.0), StructureType::Pit);
        assert_eq!(select_structure(350.0, 5.0, 12.0), StructureType::RechargeWell);
        assert_eq!(select_structure(200.0, 5.0, 12.0), StructureType::Shaft);
    }

    #[test]
    fn selector_boundaries() {
        // gw depth of exactly 5 m is not shallow
        assert_eq!(select_structure(100.0, 25.0, 5.0), StructureType::Pit);
        // open space of exactly 20 m² qualifies
        assert_eq!(select_structure(500.0, 20.0, 4.9), StructureType::Trench);
        assert_eq!(select_structure(120.0, 0.0, 20.0), StructureType::Shaft);
        assert_eq!(select_structure(300.0, 0.0, 10.0), StructureType::RechargeWell);
        assert_eq!(select_structure(299.9, 0.0, 10.0), StructureType::Shaft);
    }

    #[test]
    fn floor_binds_for_empty_target() {
        for t in StructureType::ALL {
            for target in [0.0, -10.0] {
                let d = suggest_dimensions(t, target);
                assert_eq!(d.dimensions.depth_m(), t.spec().min_depth_m, "{t}");
            }
        }
    }

    #[test]
    fn floor_storage_for_every_type() {
        let expected = [
            (StructureType::Pit, 0.40 * 1.5 * 1.5 * 1.2 * 1000.0),
            (StructureType::Trench, 0.35 * 6.0 * 0.6 * 1.2 * 1000.0),
            (StructureType::Shaft, 0.30 * PI * 0.45 * 0.45 * 6.0 * 1000.0),
            (StructureType::RechargeWell, PI * 0.25 * 8.0 * 1000.0),
        ];
        for (t, liters) in expected {
            let d = suggest_dimensions(t, 0.0);
            assert!((d.effective_storage_liters - liters).abs() < 1e-6, "{t}: {}", d.effective_storage_liters);
        }
    }

    #[test]
    fn pit_depth_is_solved_and_rounded() {
        let d = suggest_dimensions(StructureType::Pit, 17_000.0);
        assert_eq!(
            d.dimensions,
            Dimensions::Rectangular { length_m: 1.5, breadth_m: 1.5, depth_m: 18.89 }
        );
        assert!((d.effective_storage_liters - 900.0 * 18.89).abs() < 1e-6);
        assert_eq!(d.notes, "40% void ratio assumed for pebble media");
    }

    #[test]
    fn shaft_depth_uses_one_decimal() {
        let d = suggest_dimensions(StructureType::Shaft, 10_000.0);
        let depth = d.dimensions.depth_m();
        assert_eq!(depth, (depth * 10.0).round() / 10.0);
        assert!(depth > 6.0);
        assert!(matches!(d.dimensions, Dimensions::Circular { diameter_m, .. } if diameter_m == 0.9));
    }

    #[test]
    fn storage_matches_rounded_dimensions() {
        for t in StructureType::ALL {
            let d = suggest_dimensions(t, 12_345.0);
            let spec = t.spec();
            let expected = spec.void_ratio * spec.planform.area_m2() * d.dimensions.depth_m() * 1000.0;
            assert!((d.effective_storage_liters - expected).abs() < 1e-9, "{t}");
        }
    }

    #[test]
    fn storage_meets_target_within_rounding() {
        for t in StructureType::ALL {
            let spec = t.spec();
            let per_m = spec.void_ratio * spec.planform.area_m2() * 1000.0;
            let half_step = 0.5 * 10f64.powi(-spec.depth_decimals);
            for target in [5_000.0, 50_000.0, 250_000.0] {
                let d = suggest_dimensions(t, target);
                assert!(d.effective_storage_liters + per_m * half_step + 1e-9 >= target, "{t} {target}");
            }
        }
    }

    #[test]
    fn larger_target_never_shrinks_structure() {
        for t in StructureType::ALL {
            let mut last_depth = 0.0;
            let mut last_storage = 0.0;
            let mut target = 0.0;
            while target <= 200_000.0 {
                let d = suggest_dimensions(t, target);
                assert!(d.dimensions.depth_m() >= last_depth, "{t} at {target}");
                assert!(d.effective_storage_liters >= last_storage, "{t} at {target}");
                last_depth = d.dimensions.depth_m();
                last_storage = d.effective_storage_liters;
                target += 731.0;
            }
        }
    }

    #[test]
    fn parse_and_display_round_trip() {
        for t in StructureType::ALL {
            assert_eq!(t.as_str().parse::<StructureType>().unwrap(), t);
        }
        assert!("borewell".parse::<StructureType>().is_err());
    }

    #[test]
    fn dimensions_serialize_flat() {
        let d = suggest_dimensions(StructureType::Shaft, 0.0);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["structure_type"], "shaft");
        assert_eq!(json["dimensions"]["diameter_m"], 0.9);
        assert_eq!(json["dimensions"]["depth_m"], 6.0);
        assert!(json["storage_volume_liters"].is_number());
    }
}
