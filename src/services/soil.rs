// src/services/soil.rs

//! Reference soil properties (USDA Soil Survey Manual typical ranges) and a
//! coordinate-keyed placeholder soil lookup.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
    pub typical: f64,
}

impl Range {
    const fn new(min: f64, max: f64, typical: f64) -> Self {
        Self { min, max, typical }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilClass {
    pub name: &'static str,
    /// mm/hour
    pub infiltration: Range,
    /// cm/hour
    pub permeability: Range,
    /// mm
    pub water_holding: Range,
}

pub static SOIL_CLASSES: [SoilClass; 8] = [
    SoilClass {
        name: "sand",
        infiltration: Range::new(20.0, 50.0, 35.0),
        permeability: Range::new(10.0, 100.0, 55.0),
        water_holding: Range::new(50.0, 100.0, 75.0),
    },
    SoilClass {
        name: "sandy_loam",
        infiltration: Range::new(10.0, 25.0, 17.5),
        permeability: Range::new(5.0, 20.0, 12.5),
        water_holding: Range::new(100.0, 150.0, 125.0),
    },
    SoilClass {
        name: "loam",
        infiltration: Range::new(5.0, 15.0, 10.0),
        permeability: Range::new(1.0, 10.0, 5.5),
        water_holding: Range::new(150.0, 200.0, 175.0),
    },
    SoilClass {
        name: "silt_loam",
        infiltration: Range::new(2.5, 8.0, 5.25),
        permeability: Range::new(0.5, 5.0, 2.75),
        water_holding: Range::new(200.0, 250.0, 225.0),
    },
    SoilClass {
        name: "clay_loam",
        infiltration: Range::new(1.0, 4.0, 2.5),
        permeability: Range::new(0.1, 2.0, 1.05),
        water_holding: Range::new(200.0, 300.0, 250.0),
    },
    SoilClass {
        name: "clay",
        infiltration: Range::new(0.1, 1.0, 0.55),
        permeability: Range::new(0.01, 0.5, 0.255),
        water_holding: Range::new(250.0, 400.0, 325.0),
    },
    SoilClass {
        name: "silty_clay",
        infiltration: Range::new(0.05, 0.5, 0.275),
        permeability: Range::new(0.005, 0.1, 0.0525),
        water_holding: Range::new(300.0, 450.0, 375.0),
    },
    SoilClass {
        name: "sandy_clay",
        infiltration: Range::new(0.1, 2.0, 1.05),
        permeability: Range::new(0.01, 1.0, 0.505),
        water_holding: Range::new(200.0, 350.0, 275.0),
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilAtLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub soil_type: &'static str,
    pub permeability_cm_per_hour: f64,
    pub infiltration_rate_mm_per_hour: f64,
    pub water_holding_capacity_mm: f64,
    pub source: &'static str,
}

/// Placeholder classification until a soil grid is wired in: picks a class
/// from the integer part of |lat + lon|.
pub fn soil_at(latitude: f64, longitude: f64) -> SoilAtLocation {
    let idx = ((latitude + longitude).abs() as usize) % SOIL_CLASSES.len();
    let class = &SOIL_CLASSES[idx];
    SoilAtLocation {
        latitude,
        longitude,
        soil_type: class.name,
        permeability_cm_per_hour: class.permeability.typical,
        infiltration_rate_mm_per_hour: class.infiltration.typical,
        water_holding_capacity_mm: class.water_holding.typical,
        source: "mock",
    }
}

/// `{soil_name: range}` view of one property, for the reference endpoints.
pub fn property_table(pick: fn(&SoilClass) -> Range) -> serde_json::Map<String, serde_json::Value> {
    SOIL_CLASSES
        .iter()
        .map(|c| (c.name.to_string(), serde_json::json!(pick(c))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typical_values() {
        let loam = &SOIL_CLASSES[2];
        assert_eq!(loam.infiltration.typical, 10.0);
        assert_eq!(loam.permeability.typical, 5.5);
        assert_eq!(loam.water_holding.typical, 175.0);
    }

    #[test]
    fn location_lookup_is_deterministic() {
        // 12.97 + 77.59 = 90.56 → 90 % 8 = 2
        let s = soil_at(12.97, 77.59);
        assert_eq!(s.soil_type, "loam");
        assert_eq!(soil_at(12.97, 77.59), s);
        assert_eq!(soil_at(-3.2, 0.1).soil_type, "silt_loam");
    }

    #[test]
    fn property_table_lists_every_class() {
        let table = property_table(|c| c.infiltration);
        assert_eq!(table.len(), SOIL_CLASSES.len());
        assert_eq!(table["clay"]["typical"], 0.55);
    }
}
