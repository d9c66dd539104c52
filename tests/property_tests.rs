//! Property tests for the pure-math pieces: AQI interpolation and the
//! schedule window arithmetic.

use proptest::prelude::*;

use airsense::app::snapshot::SensorSnapshot;
use airsense::aqi::{self, CO2_BREAKPOINTS, INDEX_MAX, PM10_BREAKPOINTS, PM2_5_BREAKPOINTS};

/// Interpolation roundoff tolerance on the 0..=500 scale.
const SLACK: f32 = 1e-3;
use airsense::schedule::ScheduleEntry;

proptest! {
    #[test]
    fn sub_index_is_monotone_in_concentration(
        a in 0.0f32..2000.0,
        b in 0.0f32..2000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        for table in [PM2_5_BREAKPOINTS, PM10_BREAKPOINTS, CO2_BREAKPOINTS] {
            prop_assert!(
                aqi::sub_index(lo, table) <= aqi::sub_index(hi, table) + SLACK,
                "index decreased between {lo} and {hi}"
            );
        }
    }

    #[test]
    fn sub_index_stays_within_scale(value in 0.0f32..1e9) {
        for table in [PM2_5_BREAKPOINTS, PM10_BREAKPOINTS, CO2_BREAKPOINTS] {
            let idx = aqi::sub_index(value, table);
            prop_assert!(
                (-SLACK..=INDEX_MAX + SLACK).contains(&idx),
                "index {idx} out of scale"
            );
        }
    }

    // Cleaner air (higher gas resistance) never scores worse.
    #[test]
    fn voc_sub_index_is_monotone_in_resistance(
        a in 0.0f32..1_000_000.0,
        b in 0.0f32..1_000_000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(aqi::voc_sub_index(hi) <= aqi::voc_sub_index(lo) + SLACK);
        let idx = aqi::voc_sub_index(lo);
        prop_assert!((-SLACK..=INDEX_MAX + SLACK).contains(&idx));
    }

    // The composite is the worst pollutant, so it can never undercut
    // any individual sub-index.
    #[test]
    fn composite_dominates_every_sub_index(
        pm1_0 in 0u16..1000,
        pm2_5 in 0u16..1000,
        pm10 in 0u16..1500,
        co2 in 0u16..10_000,
        gas in 1_000.0f32..600_000.0,
    ) {
        let snapshot = SensorSnapshot {
            pm1_0,
            pm2_5,
            pm10,
            co2_ppm: co2,
            gas_resistance_ohm: gas,
            ..SensorSnapshot::default()
        };
        let composite = f32::from(aqi::composite(&snapshot));
        let subs = [
            aqi::sub_index(f32::from(pm2_5), PM2_5_BREAKPOINTS),
            aqi::sub_index(f32::from(pm10), PM10_BREAKPOINTS),
            aqi::sub_index(f32::from(co2), CO2_BREAKPOINTS),
            aqi::voc_sub_index(gas),
        ];
        for sub in subs {
            // Rounding to u16 can shave at most half a point.
            prop_assert!(composite + 0.5 >= sub, "composite {composite} < sub {sub}");
        }
        prop_assert!(composite <= INDEX_MAX);
    }

    #[test]
    fn schedule_never_fires_early_and_never_double_fires(
        interval in 1u64..100_000,
        start in 0u64..1_000_000,
        steps in proptest::collection::vec(0u64..50_000, 1..50),
    ) {
        let mut entry = ScheduleEntry::new("task", interval, start);
        let mut now = start;
        let mut last_fire = None;
        for step in steps {
            now += step;
            if entry.fire_if_due(now) {
                let since = now - last_fire.unwrap_or(start);
                prop_assert!(since >= interval, "fired {since}ms into a {interval}ms window");
                last_fire = Some(now);
            }
        }
    }

    // due() is a pure query: observing it never consumes the window.
    #[test]
    fn due_is_side_effect_free(interval in 1u64..10_000, now in 0u64..100_000) {
        let mut entry = ScheduleEntry::new("task", interval, 0);
        let first = entry.due(now);
        prop_assert_eq!(entry.due(now), first);
        prop_assert_eq!(entry.fire_if_due(now), first);
    }
}
