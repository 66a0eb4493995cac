// Host-side tests for scene assembly, the dolly camera and the post chain.

use forest_core::camera::{Camera, DollyCamera};
use forest_core::config::{SceneConfig, SeedSource};
use forest_core::lighting::{project_anchor, LightRig, PostChain, PostStage};
use forest_core::constants::{CANOPY_BASE_COLOR, FOLIAGE_PALETTE};
use forest_core::geometry::Shape;
use forest_core::instance::Transform;
use forest_core::material::Material;
use forest_core::rig::{assemble_avian, assemble_character, tableau_figures, Rig, WingAnimator};
use std::f32::consts::{FRAC_PI_2, PI};
use forest_core::scene::{ForestScene, PopulationCounts};
use forest_core::ConfigError;
use glam::Vec3;

fn scene() -> ForestScene {
    ForestScene::new(SceneConfig::default().with_seed(SeedSource::Fixed(2024))).expect("scene")
}

#[test]
fn default_populations_have_reference_sizes() {
    let s = scene();
    assert_eq!(
        s.counts(),
        PopulationCounts {
            foliage: 420,
            dust: 900,
            trunks: 24,
            fronds: 18,
        }
    );
    assert_eq!(s.batch("canopy").map(|b| b.instances.len()), Some(420));
    assert_eq!(s.batch("dust").map(|b| b.instances.len()), Some(900));
    assert_eq!(s.batch("trunks").map(|b| b.instances.len()), Some(24));
    assert_eq!(s.batch("crowns").map(|b| b.instances.len()), Some(24));
    assert_eq!(s.batch("fronds").map(|b| b.instances.len()), Some(18));
}

#[test]
fn counts_never_change_across_updates() -> anyhow::Result<()> {
    let mut s = ForestScene::new(SceneConfig::default().with_seed(SeedSource::Fixed(1)))?;
    let before = s.counts();
    let batches = s.batches().len();
    let dt = 1.0 / 60.0;
    for i in 0..600 {
        let graph = s.update(i as f32 * dt, dt);
        assert_eq!(graph.batches.len(), batches);
    }
    assert_eq!(s.counts(), before);
    let ceiling = SceneConfig::default().dust.bounds.upper_bound;
    assert!(s.dust().positions().iter().all(|p| p.y < ceiling));
    Ok(())
}

#[test]
fn update_moves_leaves_but_not_trunks() {
    let mut s = scene();
    let leaf0 = s.batch("canopy").unwrap().instances[0].translation();
    let trunk0 = s.batch("trunks").unwrap().instances[0].translation();
    s.update(3.0, 1.0 / 60.0);
    let leaf1 = s.batch("canopy").unwrap().instances[0].translation();
    let trunk1 = s.batch("trunks").unwrap().instances[0].translation();
    assert!((leaf1 - leaf0).length() > 1e-4);
    assert_eq!(trunk0, trunk1);
}

#[test]
fn invalid_config_aborts_construction() {
    let mut cfg = SceneConfig::default();
    cfg.canopy.palette = vec!["#12345g"];
    assert!(matches!(
        ForestScene::new(cfg).err(),
        Some(ConfigError::MalformedColor { .. })
    ));
}

#[test]
fn dolly_progress_is_monotone_and_settles_on_the_end_pose() {
    let mut cam = DollyCamera::default();
    let dt = 0.1;
    let mut last = cam.progress();
    let steps = (cam.travel_time() / dt).ceil() as usize + 1;
    for i in 1..=steps {
        cam.advance(i as f32 * dt, dt);
        assert!(cam.progress() >= last);
        last = cam.progress();
    }
    assert!(cam.is_settled());
    assert_eq!(cam.progress(), 1.0);

    for &t in &[7.0_f32, 12.5, 40.0] {
        let pose = cam.advance(t, 0.1);
        let bob = (t * cam.bob_frequency).sin() * cam.bob_amplitude;
        assert_eq!(pose.position, cam.end + Vec3::new(0.0, bob, 0.0));
        assert_eq!(pose.target, cam.look_at);
    }
}

#[test]
fn dolly_ignores_negative_steps() {
    let mut cam = DollyCamera::default();
    cam.advance(1.0, 0.5);
    let p = cam.progress();
    cam.advance(1.0, -0.3);
    assert_eq!(cam.progress(), p);
}

#[test]
fn dolly_starts_wide() {
    let cam = DollyCamera::default();
    let pose = cam.pose(0.0);
    assert_eq!(pose.position, cam.start);
}

#[test]
fn post_chain_order_is_validated() {
    let chain = PostChain::forest();
    let names: Vec<_> = chain.stages().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        ["light_shafts", "bloom", "depth_of_field", "grain", "vignette"]
    );
    assert!(chain.validate().is_ok());

    let grain = *chain.grain().unwrap();
    let bloom = *chain.bloom().unwrap();
    let err = PostChain::new(vec![grain, bloom]).err();
    assert_eq!(err, Some(ConfigError::PostOrder { stage: "bloom" }));
}

#[test]
fn light_shaft_parameters_match_the_tableau() {
    match PostChain::forest().light_shafts() {
        Some(PostStage::LightShafts {
            samples,
            density,
            decay,
            ..
        }) => {
            assert_eq!(*samples, 120);
            assert!((density - 0.96).abs() < 1e-6);
            assert!((decay - 0.96).abs() < 1e-6);
        }
        other => panic!("unexpected stage {:?}", other),
    }
}

#[test]
fn sun_sits_just_above_the_frame_for_the_whole_dolly() {
    let lights = LightRig::forest().unwrap();
    let mut cam = DollyCamera::default();
    let dt = 0.25;
    for i in 0..40 {
        let pose = cam.advance(i as f32 * dt, dt);
        let camera = Camera::new(pose, 16.0 / 9.0);
        let anchor = project_anchor(camera.view_projection(), lights.sun.position);
        assert!(anchor.visibility > 0.0, "step {} visibility {}", i, anchor.visibility);
        assert!(anchor.uv.y < 0.0, "step {} uv {:?}", i, anchor.uv);
        assert!((0.0..=1.0).contains(&anchor.uv.x), "step {} uv {:?}", i, anchor.uv);
    }
}

#[test]
fn sun_behind_the_camera_has_no_shafts() {
    let cam = DollyCamera::default();
    let camera = Camera::new(cam.pose(0.0), 1.0);
    let behind = camera.eye + (camera.eye - camera.target);
    assert_eq!(project_anchor(camera.view_projection(), behind).visibility, 0.0);
}

#[test]
fn kneeling_lowers_the_torso_and_shortens_the_robe() {
    let (_, mut params) = tableau_figures().into_iter().next().unwrap();
    params.kneeling = true;
    let kneeling = assemble_character("a", &params).unwrap();
    params.kneeling = false;
    let standing = assemble_character("b", &params).unwrap();

    let torso_y = |r: &forest_core::rig::Rig| r.part("torso").unwrap().local.position.y;
    assert!(torso_y(&kneeling) < torso_y(&standing));
    assert_ne!(
        kneeling.part("robe").unwrap().shape,
        standing.part("robe").unwrap().shape
    );
    assert_ne!(
        kneeling.part("robe").unwrap().local.position,
        standing.part("robe").unwrap().local.position
    );
}

#[test]
fn bow_adds_two_mesh_parts() {
    let (_, mut params) = tableau_figures().into_iter().next().unwrap();
    params.holds_bow = true;
    let with_bow = assemble_character("a", &params).unwrap();
    params.holds_bow = false;
    let without = assemble_character("b", &params).unwrap();
    assert_eq!(with_bow.mesh_count(), without.mesh_count() + 2);
    assert!(with_bow.part("bow_limb").is_some());
    assert!(with_bow.part("bow_string").is_some());
    assert!(without.part("bow").is_none());
}

#[test]
fn bow_parts_follow_their_group() {
    let (_, params) = tableau_figures().into_iter().next().unwrap();
    let rig = assemble_character("rama", &params).unwrap();
    let group = rig.world_position("bow").unwrap();
    let limb = rig.world_position("bow_limb").unwrap();
    assert!((group - limb).length() < 1e-5);
}

#[test]
fn wings_mirror_each_other() {
    let wings = WingAnimator::default();
    let mut rig = assemble_avian().unwrap();
    for i in 0..50 {
        let t = i as f32 * 0.37;
        let (l, r) = wings.angles(t);
        assert!((l + r).abs() < 1e-6);
        assert!((l - wings.base).abs() <= wings.amplitude + 1e-6);
        wings.apply(&mut rig, t);
        let left = rig.part("wing_left").unwrap().local.rotation.z;
        let right = rig.part("wing_right").unwrap().local.rotation.z;
        assert!((left + right).abs() < 1e-6);
    }
}

#[test]
fn scene_publishes_wing_motion() {
    let mut s = scene();
    s.update(0.0, 0.0);
    let a = s.batch("wing_left").unwrap().instances[0].model;
    s.update(2.0, 0.016);
    let b = s.batch("wing_left").unwrap().instances[0].model;
    assert_ne!(a, b);
}

fn close(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn arms_point_outward_on_their_own_side() {
    let (_, params) = tableau_figures().into_iter().next().unwrap();
    let rig = assemble_character("rama", &params).unwrap();
    let skin = Material::standard(params.skin, 0.45, 0.0).unwrap();
    for (name, side) in [("arm_left", -1.0_f32), ("arm_right", 1.0)] {
        let arm = rig.part(name).unwrap();
        assert!(close(arm.local.position, Vec3::new(0.38 * side, 1.1 + 0.32, -0.2)), "{name}");
        assert!(close(arm.local.rotation, Vec3::new(PI / 1.4, 0.4 * side, side * PI / 2.3)), "{name}");
        assert_eq!(arm.local.position.x.signum(), arm.local.rotation.y.signum());
        assert_eq!(arm.local.position.x.signum(), arm.local.rotation.z.signum());
        assert_eq!(arm.material, Some(skin));
        assert_eq!(
            arm.shape,
            Some(Shape::Cylinder {
                top: 0.08,
                bottom: 0.12,
                height: 0.65,
                segments: 12,
            })
        );
    }
}

#[test]
fn standing_arms_sit_forward() {
    let (_, mut params) = tableau_figures().into_iter().next().unwrap();
    params.kneeling = false;
    let rig = assemble_character("standing", &params).unwrap();
    let arm = rig.part("arm_right").unwrap();
    assert!(close(arm.local.position, Vec3::new(0.38, 1.45 + 0.32, 0.08)));
}

#[test]
fn head_and_accent_ride_on_the_torso() {
    let (_, mut params) = tableau_figures().into_iter().nth(1).unwrap();
    for (kneeling, th) in [(true, 1.1_f32), (false, 1.45)] {
        params.kneeling = kneeling;
        let rig = assemble_character("figure", &params).unwrap();

        let head = rig.part("head").unwrap();
        assert!(close(head.local.position, Vec3::new(0.0, th + 0.65, 0.02)));
        assert_eq!(head.shape, Some(Shape::Sphere { radius: 0.28 }));
        assert_eq!(head.material, Some(Material::standard(params.skin, 0.45, 0.0).unwrap()));

        let accent = rig.part("accent").unwrap();
        assert!(close(accent.local.position, Vec3::new(0.0, th + 0.25, 0.35)));
        assert!(close(accent.local.rotation, Vec3::new(FRAC_PI_2, 0.0, 0.0)));
        assert_eq!(
            accent.shape,
            Some(Shape::Torus {
                radius: 0.5,
                tube: 0.08,
            })
        );
        assert_eq!(accent.material, Some(Material::standard(params.accent, 0.4, 0.35).unwrap()));

        let torso = rig.part("torso").unwrap();
        assert_eq!(torso.material, Some(Material::standard(params.robe, 0.55, 0.08).unwrap()));
    }
}

#[test]
fn avian_parts_carry_their_surfaces() {
    let rig = assemble_avian().unwrap();
    let surface = |name: &str| {
        let m = rig.part(name).unwrap().material.unwrap();
        (m.roughness, m.metalness)
    };
    assert_eq!(surface("body"), (0.6, 0.1));
    assert_eq!(surface("beak"), (0.35, 0.25));
    assert_eq!(surface("neck"), (0.6, 0.0));
    assert_eq!(surface("wing_left"), (0.65, 0.05));
    assert_eq!(surface("wing_right"), (0.65, 0.05));
    assert_eq!(surface("leg_left"), (0.5, 0.0));
    assert!(rig.part("wing_left").unwrap().material.unwrap().double_sided);
}

#[test]
fn vegetation_surfaces_match_the_tableau() {
    let s = scene();
    let surface = |label: &str| {
        let m = s.batch(label).unwrap().material;
        (m.roughness, m.metalness)
    };
    assert_eq!(surface("canopy"), (0.6, 0.05));
    assert_eq!(surface("trunks"), (0.85, 0.06));
    assert_eq!(surface("crowns"), (0.7, 0.05));
    assert_eq!(surface("fronds"), (0.65, 0.05));
}

#[test]
fn leaf_tint_is_base_times_palette() {
    let s = scene();
    let base = Material::standard(CANOPY_BASE_COLOR, 0.6, 0.05).unwrap().linear_color();
    let tints: Vec<[f32; 3]> = FOLIAGE_PALETTE
        .iter()
        .map(|hex| {
            let leaf = Material::standard(hex, 1.0, 0.0).unwrap().linear_color();
            [base[0] * leaf[0], base[1] * leaf[1], base[2] * leaf[2]]
        })
        .collect();
    for raw in &s.batch("canopy").unwrap().instances {
        let c = raw.color;
        assert!(
            tints
                .iter()
                .any(|t| (0..3).all(|k| (t[k] - c[k]).abs() < 1e-6)),
            "unexpected leaf tint {:?}",
            c
        );
        assert!((c[3] - 0.95).abs() < 1e-6);
    }
}

#[test]
fn unknown_parent_is_a_config_error() {
    let mut rig = Rig::new("test", Transform::default());
    rig.add("group", None, None, None, Transform::default()).unwrap();
    assert_eq!(
        rig.add("child", Some("grroup"), None, None, Transform::default()),
        Err(ConfigError::UnknownRigParent {
            rig: "test",
            part: "child",
            parent: "grroup",
        })
    );
    assert!(rig.add("child", Some("group"), None, None, Transform::default()).is_ok());
    assert_eq!(rig.parts()[1].parent, Some(0));
}

#[test]
fn world_matrix_past_the_end_is_none() {
    let (_, params) = tableau_figures().into_iter().next().unwrap();
    let rig = assemble_character("rama", &params).unwrap();
    assert!(rig.world_matrix(rig.parts().len()).is_none());
    assert!(rig.world_matrix(0).is_some());
}
