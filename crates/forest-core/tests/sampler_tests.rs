// Host-side tests for the procedural sampler.

use forest_core::config::{CanopyConfig, DustConfig, FrondConfig, SceneConfig, SeedSource, TrunkConfig};
use forest_core::constants::*;
use forest_core::material::parse_hex_color;
use forest_core::sampler::Sampler;

fn fixed(seed: u64) -> Sampler {
    Sampler::new(SeedSource::Fixed(seed))
}

#[test]
fn canopy_samples_stay_in_bounds() {
    let cfg = CanopyConfig::default();
    let samples = fixed(11).canopy(&cfg, FOREST_RADIUS).expect("canopy");
    assert_eq!(samples.len(), LEAF_COUNT);
    let palette: Vec<[f32; 3]> = FOLIAGE_PALETTE
        .iter()
        .map(|h| parse_hex_color(h).unwrap())
        .collect();
    let max_r = FOREST_RADIUS * LEAF_RADIUS_FRACTION;
    for s in &samples {
        let r = (s.position.x * s.position.x + s.position.z * s.position.z).sqrt();
        assert!(r <= max_r + 1e-4, "radius {} > {}", r, max_r);
        assert!(s.position.y >= LEAF_HEIGHT_BASE - 1e-5);
        assert!(s.position.y <= LEAF_HEIGHT_BASE + LEAF_HEIGHT_SPAN + 1e-5);
        assert!(cfg.scale.contains(s.scale), "scale {}", s.scale);
        assert!((0.0..std::f32::consts::TAU).contains(&s.phase));
        assert!(palette.contains(&s.color));
    }
}

#[test]
fn dust_samples_start_below_the_ceiling() {
    let cfg = DustConfig::default();
    let samples = fixed(3).dust(&cfg, FOREST_RADIUS).expect("dust");
    assert_eq!(samples.len(), DUST_COUNT);
    for s in &samples {
        assert!(s.origin.y < cfg.bounds.upper_bound);
        assert!(cfg.origin_height.contains(s.origin.y));
        assert!(cfg.speed.contains(s.speed));
        assert!(cfg.drift.contains(s.drift));
        assert!(cfg.vertical_velocity.contains(s.vertical_velocity));
        let r = (s.origin.x * s.origin.x + s.origin.z * s.origin.z).sqrt();
        assert!(r <= FOREST_RADIUS * DUST_RADIUS_FRACTION + 1e-4);
    }
}

#[test]
fn trunks_ring_the_clearing_and_stand_on_the_floor() {
    let cfg = TrunkConfig::default();
    let trunks = fixed(5).trunks(&cfg).expect("trunks");
    assert_eq!(trunks.len(), TRUNK_COUNT);
    for t in &trunks {
        let r = (t.position.x * t.position.x + t.position.z * t.position.z).sqrt();
        assert!(cfg.radius.contains(r) || (r - cfg.radius.max).abs() < 1e-3, "r={}", r);
        assert!(cfg.scale.contains(t.scale));
        assert!((t.position.y - t.scale / 2.0).abs() < 1e-6);
    }
}

#[test]
fn fronds_fill_the_foreground_band() {
    let cfg = FrondConfig::default();
    let fronds = fixed(8).fronds(&cfg).expect("fronds");
    assert_eq!(fronds.len(), FROND_COUNT);
    for f in &fronds {
        assert!(cfg.x.contains(f.position.x));
        assert!(cfg.z.contains(f.position.z));
        assert_eq!(f.position.y, FROND_HEIGHT);
        assert_eq!(f.rotation.x, FROND_PITCH);
        assert!(cfg.yaw.contains(f.rotation.y));
        assert!(cfg.roll.contains(f.rotation.z));
    }
}

#[test]
fn fixed_seed_is_reproducible() {
    let cfg = SceneConfig::default();
    let a = fixed(42).canopy(&cfg.canopy, cfg.forest_radius).unwrap();
    let b = fixed(42).canopy(&cfg.canopy, cfg.forest_radius).unwrap();
    assert_eq!(a, b);
    let c = fixed(43).canopy(&cfg.canopy, cfg.forest_radius).unwrap();
    assert_ne!(a, c);
}

#[test]
fn shrinking_a_population_keeps_its_prefix() {
    let full = fixed(9).dust(&DustConfig::default(), FOREST_RADIUS).unwrap();
    let mut small = DustConfig::default();
    small.count = 10;
    let head = fixed(9).dust(&small, FOREST_RADIUS).unwrap();
    assert_eq!(&full[..10], &head[..]);
}

#[test]
fn zero_count_is_rejected() {
    let mut cfg = CanopyConfig::default();
    cfg.count = 0;
    assert!(fixed(1).canopy(&cfg, FOREST_RADIUS).is_err());
}
