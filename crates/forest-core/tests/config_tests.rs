// Host-side tests for configuration validation.

use forest_core::config::{SceneConfig, Span};
use forest_core::material::{parse_hex_color, Material};
use forest_core::ConfigError;

#[test]
fn default_config_is_valid() {
    assert!(SceneConfig::default().validate().is_ok());
}

#[test]
fn hex_colors_parse_to_unit_components() {
    let c = parse_hex_color("#ff8000").unwrap();
    assert_eq!(c[0], 1.0);
    assert!((c[1] - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(c[2], 0.0);
}

#[test]
fn malformed_colors_are_rejected() {
    for bad in ["", "ff8000", "#ff80", "#ff80001", "#gg8000", "#ff80é"] {
        assert!(
            matches!(parse_hex_color(bad), Err(ConfigError::MalformedColor { .. })),
            "accepted {:?}",
            bad
        );
    }
    assert!(Material::standard("#zzzzzz", 0.5, 0.0).is_err());
}

#[test]
fn empty_populations_are_rejected() {
    let mut cfg = SceneConfig::default();
    cfg.dust.count = 0;
    assert_eq!(
        cfg.validate(),
        Err(ConfigError::EmptyPopulation { population: "dust" })
    );
    let mut cfg = SceneConfig::default();
    cfg.canopy.palette.clear();
    assert!(matches!(cfg.validate(), Err(ConfigError::EmptyPopulation { .. })));
}

#[test]
fn inverted_and_non_finite_ranges_are_rejected() {
    assert!(matches!(
        Span::new(2.0, 1.0).validate("x"),
        Err(ConfigError::InvertedRange { field: "x", .. })
    ));
    assert!(matches!(
        Span::new(f32::NAN, 1.0).validate("y"),
        Err(ConfigError::NonFinite { field: "y", .. })
    ));
    let mut cfg = SceneConfig::default();
    cfg.forest_radius = 0.0;
    assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));
}

#[test]
fn dust_origins_must_start_below_the_ceiling() {
    let mut cfg = SceneConfig::default();
    cfg.dust.origin_height = Span::new(1.0, cfg.dust.bounds.upper_bound + 0.5);
    assert!(matches!(cfg.validate(), Err(ConfigError::DustBounds(_))));
}
