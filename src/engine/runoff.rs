// src/engine/runoff.rs

/// Runoff coefficient used when the caller does not pick one (RCC roof).
pub const DEFAULT_RUNOFF_COEFFICIENT: f64 = 0.85;

/// Annual rooftop runoff in liters.
///
/// 1 mm of rain over 1 m² is exactly 1 liter, so the product needs no unit
/// conversion. Inputs are validated at the boundary; nothing is clamped here.
pub fn estimate_runoff(annual_rainfall_mm: f64, roof_area_m2: f64, runoff_coefficient: f64) -> f64 {
    annual_rainfall_mm * roof_area_m2 * runoff_coefficient
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_coefficient_is_plain_depth_times_area() {
        for (mm, area) in [(0.0, 0.0), (800.0, 100.0), (1234.5, 87.25), (3.3, 0.1)] {
            assert_eq!(estimate_runoff(mm, area, 1.0), mm * area);
        }
    }

    #[test]
    fn default_coefficient_scales_runoff() {
        let liters = estimate_runoff(800.0, 100.0, DEFAULT_RUNOFF_COEFFICIENT);
        assert!((liters - 68_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_roof_yields_zero() {
        assert_eq!(estimate_runoff(1500.0, 0.0, 0.85), 0.0);
    }
}
