//! Composite air-quality index.
//!
//! Each pollutant with a breakpoint table gets a sub-index via
//! piecewise-linear interpolation; the composite score is the maximum
//! sub-index (worst pollutant dominates — standard AQI convention,
//! never an average).
//!
//! The VOC table is inverted: the BME680 reports *gas resistance*, and
//! higher resistance means cleaner air, so decreasing resistance maps
//! to an increasing index.

use crate::app::snapshot::SensorSnapshot;

/// Saturation ceiling shared by every table.
pub const INDEX_MAX: f32 = 500.0;

/// `(concentration, index)` anchors, ascending by concentration.
type Breakpoints = [(f32, f32)];

/// PM2.5 (µg/m³) — fine particulate.
pub const PM2_5_BREAKPOINTS: &Breakpoints = &[
    (0.0, 0.0),
    (12.0, 50.0),
    (35.0, 100.0),
    (55.0, 150.0),
    (150.0, 200.0),
    (250.0, 300.0),
    (500.0, 500.0),
];

/// PM10 (µg/m³) — coarse particulate.
pub const PM10_BREAKPOINTS: &Breakpoints = &[
    (0.0, 0.0),
    (54.0, 50.0),
    (154.0, 100.0),
    (254.0, 150.0),
    (354.0, 200.0),
    (424.0, 300.0),
    (604.0, 500.0),
];

/// CO2 (ppm).
pub const CO2_BREAKPOINTS: &Breakpoints = &[
    (0.0, 0.0),
    (600.0, 50.0),
    (800.0, 100.0),
    (1000.0, 150.0),
    (1500.0, 200.0),
    (2000.0, 300.0),
    (5000.0, 500.0),
];

/// VOC proxy via gas resistance (Ω), *descending* resistance.
/// Below the last anchor the index saturates at 500.
pub const GAS_RESISTANCE_BREAKPOINTS: &Breakpoints = &[
    (500_000.0, 0.0),
    (200_000.0, 50.0),
    (100_000.0, 100.0),
    (50_000.0, 150.0),
    (10_000.0, 200.0),
    (5_000.0, 300.0),
];

/// Piecewise-linear sub-index over an ascending breakpoint table.
///
/// Uses the first segment whose upper breakpoint is >= `value`, so an
/// exact boundary yields the upper index of the lower segment
/// (PM2.5 = 35 → 100). Values beyond the last anchor saturate at the
/// table maximum.
pub fn sub_index(value: f32, table: &Breakpoints) -> f32 {
    let (first_c, first_i) = table[0];
    if value <= first_c {
        return first_i;
    }
    for window in table.windows(2) {
        let (lo_c, lo_i) = window[0];
        let (hi_c, hi_i) = window[1];
        if value <= hi_c {
            return (hi_i - lo_i) * (value - lo_c) / (hi_c - lo_c) + lo_i;
        }
    }
    INDEX_MAX
}

/// VOC sub-index from gas resistance, interpolating the inverted table.
pub fn voc_sub_index(gas_resistance_ohm: f32) -> f32 {
    let (cleanest_r, cleanest_i) = GAS_RESISTANCE_BREAKPOINTS[0];
    if gas_resistance_ohm >= cleanest_r {
        return cleanest_i;
    }
    for window in GAS_RESISTANCE_BREAKPOINTS.windows(2) {
        let (hi_r, lo_i) = window[0];
        let (lo_r, hi_i) = window[1];
        if gas_resistance_ohm >= lo_r {
            return (hi_i - lo_i) * (hi_r - gas_resistance_ohm) / (hi_r - lo_r) + lo_i;
        }
    }
    INDEX_MAX
}

/// Composite score: the worst sub-index across every pollutant with a
/// defined table, rounded to an integer index.
pub fn composite(snapshot: &SensorSnapshot) -> u16 {
    let pm2_5 = sub_index(f32::from(snapshot.pm2_5), PM2_5_BREAKPOINTS);
    let pm10 = sub_index(f32::from(snapshot.pm10), PM10_BREAKPOINTS);
    let co2 = sub_index(f32::from(snapshot.co2_ppm), CO2_BREAKPOINTS);
    let voc = voc_sub_index(snapshot.gas_resistance_ohm);

    let worst = pm2_5.max(pm10).max(co2).max(voc);
    worst.round().min(INDEX_MAX) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_concentration_is_zero_index() {
        assert_eq!(sub_index(0.0, PM2_5_BREAKPOINTS), 0.0);
        assert_eq!(sub_index(0.0, PM10_BREAKPOINTS), 0.0);
        assert_eq!(sub_index(0.0, CO2_BREAKPOINTS), 0.0);
    }

    #[test]
    fn exact_boundary_yields_upper_index_of_lower_segment() {
        // Segment (12, 35] maps onto (50, 100]; evaluated at the top.
        assert!((sub_index(35.0, PM2_5_BREAKPOINTS) - 100.0).abs() < f32::EPSILON);
        assert!((sub_index(12.0, PM2_5_BREAKPOINTS) - 50.0).abs() < f32::EPSILON);
        assert!((sub_index(154.0, PM10_BREAKPOINTS) - 100.0).abs() < f32::EPSILON);
        assert!((sub_index(1000.0, CO2_BREAKPOINTS) - 150.0).abs() < f32::EPSILON);
    }

    #[test]
    fn interpolates_inside_a_segment() {
        // Midpoint of (12, 35] → midpoint of (50, 100].
        let mid = sub_index(23.5, PM2_5_BREAKPOINTS);
        assert!((mid - 75.0).abs() < 0.01);
    }

    #[test]
    fn saturates_beyond_last_breakpoint() {
        assert_eq!(sub_index(9999.0, PM2_5_BREAKPOINTS), INDEX_MAX);
        assert_eq!(sub_index(10_000.0, CO2_BREAKPOINTS), INDEX_MAX);
        assert_eq!(voc_sub_index(100.0), INDEX_MAX);
    }

    #[test]
    fn voc_table_is_inverted() {
        // Very clean air: huge gas resistance → index 0.
        assert_eq!(voc_sub_index(800_000.0), 0.0);
        assert_eq!(voc_sub_index(500_000.0), 0.0);
        // Dirtier air (lower resistance) scores strictly worse.
        assert!(voc_sub_index(150_000.0) > voc_sub_index(300_000.0));
        assert!((voc_sub_index(200_000.0) - 50.0).abs() < f32::EPSILON);
        assert!((voc_sub_index(5_000.0) - 300.0).abs() < f32::EPSILON);
    }

    #[test]
    fn composite_is_worst_pollutant() {
        let snapshot = SensorSnapshot {
            pm2_5: 35, // sub-index 100
            pm10: 30,  // sub-index < 50
            co2_ppm: 600,
            gas_resistance_ohm: 500_000.0,
            ..SensorSnapshot::default()
        };
        assert_eq!(composite(&snapshot), 100);
    }

    #[test]
    fn composite_never_below_any_sub_index() {
        let snapshot = SensorSnapshot {
            pm2_5: 20,
            pm10: 180,
            co2_ppm: 1600,
            gas_resistance_ohm: 40_000.0,
            ..SensorSnapshot::default()
        };
        let score = f32::from(composite(&snapshot));
        assert!(score + 0.5 >= sub_index(20.0, PM2_5_BREAKPOINTS));
        assert!(score + 0.5 >= sub_index(180.0, PM10_BREAKPOINTS));
        assert!(score + 0.5 >= sub_index(1600.0, CO2_BREAKPOINTS));
        assert!(score + 0.5 >= voc_sub_index(40_000.0));
    }

    #[test]
    fn all_zero_inputs_score_zero() {
        let snapshot = SensorSnapshot {
            // Zero gas resistance would read as filthy air; a pristine
            // snapshot means resistance at or above the cleanest anchor.
            gas_resistance_ohm: 500_000.0,
            ..SensorSnapshot::default()
        };
        assert_eq!(composite(&snapshot), 0);
    }
}
