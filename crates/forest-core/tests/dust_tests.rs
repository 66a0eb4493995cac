// Host-side tests for the dust recycler.

use forest_core::config::DustBounds;
use forest_core::dust::DustField;
use forest_core::error::ConfigError;
use forest_core::sampler::DustSample;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample(origin: Vec3, speed: f32, vv: f32) -> DustSample {
    DustSample {
        origin,
        speed,
        drift: 0.4,
        vertical_velocity: vv,
    }
}

#[test]
fn four_particles_ten_frames_stay_below_bound() {
    let bounds = DustBounds::default();
    let samples = vec![
        sample(Vec3::new(0.0, 6.3, 0.0), 1.4, 0.25),
        sample(Vec3::new(1.0, 3.0, -1.0), 0.5, 0.1),
        sample(Vec3::new(-2.0, 6.45, 2.0), 1.0, 0.2),
        sample(Vec3::new(0.5, 0.8, 0.5), 0.3, 0.08),
    ];
    let mut field = DustField::new(samples, bounds, StdRng::seed_from_u64(7)).expect("field");
    for _ in 0..10 {
        field.step(0.1);
        for p in field.positions() {
            assert!(p.y < bounds.upper_bound, "y={} escaped", p.y);
        }
    }
    assert!(field.recycled_total() >= 1);
    assert_eq!(field.len(), 4);
}

#[test]
fn recycled_particles_land_near_their_origin() {
    let bounds = DustBounds::default();
    let origin = Vec3::new(2.0, 6.49, -3.0);
    let mut field = DustField::new(vec![sample(origin, 1.0, 1.0)], bounds, StdRng::seed_from_u64(1)).unwrap();
    field.step(0.1);
    assert_eq!(field.recycled_last_step(), 1);
    let p = field.positions()[0];
    assert!((p.x - origin.x).abs() <= bounds.jitter + 1e-6);
    assert!((p.z - origin.z).abs() <= bounds.jitter + 1e-6);
    assert!(bounds.restart_height.contains(p.y));
}

#[test]
fn negative_dt_is_treated_as_zero() {
    let origin = Vec3::new(0.0, 2.0, 0.0);
    let mut field = DustField::new(
        vec![sample(origin, 1.0, 0.2)],
        DustBounds::default(),
        StdRng::seed_from_u64(2),
    )
    .unwrap();
    field.step(-0.5);
    assert_eq!(field.positions()[0], origin);
}

#[test]
fn origins_at_the_ceiling_are_rejected() {
    let bounds = DustBounds::default();
    let err = DustField::new(
        vec![sample(Vec3::new(0.0, bounds.upper_bound, 0.0), 1.0, 0.1)],
        bounds,
        StdRng::seed_from_u64(3),
    )
    .err();
    assert!(matches!(err, Some(ConfigError::DustBounds(_))));
}

#[test]
fn restart_band_must_sit_below_the_ceiling() {
    let mut bounds = DustBounds::default();
    bounds.restart_height.max = bounds.upper_bound;
    assert!(matches!(bounds.validate(), Err(ConfigError::DustBounds(_))));
}

#[test]
fn landing_exactly_on_the_ceiling_recycles() {
    let bounds = DustBounds::default();
    let origin = Vec3::new(0.0, bounds.upper_bound - 0.5, 0.0);
    let mut field = DustField::new(vec![sample(origin, 1.0, 0.5)], bounds, StdRng::seed_from_u64(4)).unwrap();
    field.step(1.0);
    assert_eq!(field.recycled_last_step(), 1);
    assert!(field.positions()[0].y < bounds.upper_bound);
}
