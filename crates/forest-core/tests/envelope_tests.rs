// Host-side tests for the envelope interpreter and the engagement schedule.

use forest_core::audio::{nodes, AudioNodeGraph, Envelope, ParamRef};
use forest_core::constants::BREAKPOINT_SPACING_SEC;
use forest_core::ConfigError;

const T0: f64 = 3.25;

fn schedule() -> forest_core::audio::EngagementSchedule {
    AudioNodeGraph::ambient_forest()
        .engagement_schedule(T0)
        .expect("schedule")
}

#[test]
fn resonance_peaks_then_settles_toward_its_floor() {
    let s = schedule();
    let at = |t: f64| s.value_at("resonance", T0 + t).unwrap();
    assert!(at(0.0).abs() < 1e-6);
    assert!((at(4.0) - 0.05).abs() < 1e-6);
    assert!((at(8.0) - 0.1).abs() < 1e-6);
    // held between the ramp end and the approach start
    assert!((at(10.0) - 0.1).abs() < 1e-6);
    assert!((at(12.0) - 0.1).abs() < 1e-6);
    let expected = 0.03 + 0.07 * (-8.0_f32 / 5.0).exp();
    assert!((at(20.0) - expected).abs() < 1e-6, "{} vs {}", at(20.0), expected);
}

#[test]
fn master_rises_monotonically_to_target() {
    let s = schedule();
    let mut last = -1.0_f32;
    for i in 0..=600 {
        let v = s.value_at("master", T0 + i as f64 * 0.01).unwrap();
        assert!(v >= last, "dropped at step {}", i);
        last = v;
    }
    assert!((s.value_at("master", T0 + 6.0).unwrap() - 0.7).abs() < 1e-6);
    assert!((s.value_at("master", T0 + 60.0).unwrap() - 0.7).abs() < 1e-6);
}

#[test]
fn wind_filter_chains_two_approaches() {
    let s = schedule();
    let at = |t: f64| s.value_at("wind_filter", T0 + t).unwrap();
    assert!((at(0.0) - 320.0).abs() < 1e-3);
    let at9 = 360.0 + (320.0 - 360.0) * (-9.0_f32 / 4.0).exp();
    assert!((at(9.0) - at9).abs() < 1e-3);
    let at15 = 260.0 + (at9 - 260.0) * (-1.0_f32).exp();
    assert!((at(15.0) - at15).abs() < 1e-2);
    assert!((at(200.0) - 260.0).abs() < 1e-2);
}

#[test]
fn wind_gain_holds_then_drops() {
    let s = schedule();
    let at = |t: f64| s.value_at("wind_gain", T0 + t).unwrap();
    assert!((at(3.0) - 0.28).abs() < 1e-6);
    assert!((at(6.0) - 0.28).abs() < 1e-6);
    assert!(at(12.0) < 0.28 && at(12.0) > 0.18);
}

#[test]
fn chime_swells_and_fades() {
    let s = schedule();
    let at = |t: f64| s.value_at("chime", T0 + t).unwrap();
    assert!((at(4.0) - 0.02).abs() < 1e-7);
    assert!((at(9.0) - 0.02).abs() < 1e-7);
    assert!((at(100.0) - 0.006).abs() < 1e-5);
}

#[test]
fn settle_time_is_the_latest_five_tau() {
    let s = schedule();
    // wind filter and chime both start at +9 with tau 6
    assert!((s.settle_time() - 39.0).abs() < 1e-9);
    assert!(!s.is_steady(T0 + 38.9));
    assert!(s.is_steady(T0 + 39.0));
}

#[test]
fn schedules_are_identical_for_the_same_origin() {
    assert_eq!(schedule(), schedule());
}

#[test]
fn schedule_targets_the_expected_params() {
    let s = schedule();
    let master = s.get("master").unwrap();
    assert_eq!(master.target, ParamRef::gain(nodes::MASTER));
    let filter = s.get("wind_filter").unwrap();
    assert_eq!(filter.target, ParamRef::frequency(nodes::WIND_FILTER));
}

#[test]
fn linear_ramp_after_an_approach_is_rejected() {
    let env = Envelope::new(0.0, 0.0)
        .approach(1.0, 0.0, 1.0)
        .linear_ramp(0.5, 4.0);
    assert!(matches!(
        env.validate("test"),
        Err(ConfigError::Envelope { .. })
    ));
}

#[test]
fn out_of_order_and_degenerate_events_are_rejected() {
    let backwards = Envelope::new(0.0, 5.0).linear_ramp(1.0, 4.0);
    assert!(backwards.validate("a").is_err());
    let zero_tau = Envelope::new(0.0, 0.0).approach(1.0, 1.0, 0.0);
    assert!(zero_tau.validate("b").is_err());
    let nan = Envelope::new(f32::NAN, 0.0);
    assert!(nan.validate("c").is_err());
}

#[test]
fn values_before_the_origin_are_the_held_value() {
    let env = Envelope::new(0.4, 10.0).linear_ramp(1.0, 12.0);
    assert_eq!(env.evaluate(0.0), 0.4);
    assert!((env.evaluate(11.0) - 0.7).abs() < 1e-6);
}

#[test]
fn breakpoints_cover_the_settle_window_and_hit_ramp_ends() {
    let env = schedule().get("resonance").unwrap().envelope.clone();
    let points = env.breakpoints(BREAKPOINT_SPACING_SEC);
    let (first_t, first_v) = points[0];
    assert!((first_t - T0).abs() < 1e-9);
    assert!(first_v.abs() < 1e-6);
    let (last_t, _) = *points.last().unwrap();
    assert!((last_t - (T0 + env.settle_time())).abs() < 1e-9);
    assert!(points.windows(2).all(|w| w[1].0 > w[0].0));
    assert!(points
        .iter()
        .any(|&(t, v)| (t - (T0 + 8.0)).abs() < 1e-9 && (v - 0.1).abs() < 1e-6));
    // linear replay between breakpoints stays close to the curve
    for w in points.windows(2) {
        let mid = 0.5 * (w[0].0 + w[1].0);
        let replay = 0.5 * (w[0].1 + w[1].1);
        assert!((replay - env.evaluate(mid)).abs() < 1e-3);
    }
}
