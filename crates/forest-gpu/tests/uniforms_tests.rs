// Host-side tests for the uniform blocks fed to the scene and post shaders.

use forest_core::lighting::LightRig;
use forest_core::{ForestScene, PostChain, SceneConfig, SeedSource, ShaftAnchor};
use forest_gpu::uniforms::{key_light_view_projection, PostUniforms, SceneUniforms};
use glam::{Vec2, Vec3, Vec4};

const EPS: f32 = 1e-5;

fn anchor() -> ShaftAnchor {
    ShaftAnchor {
        uv: Vec2::new(0.4, -0.1),
        visibility: 0.8,
    }
}

#[test]
fn blocks_match_wgsl_layout() {
    assert_eq!(std::mem::size_of::<SceneUniforms>(), 2 * 64 + 11 * 16);
    assert_eq!(std::mem::size_of::<PostUniforms>(), 7 * 16);
}

#[test]
fn forest_chain_flattens_every_stage() {
    let u = PostUniforms::from_chain(&PostChain::forest(), anchor(), (1280, 720), 2.0, (0.1, 120.0));
    assert_eq!(u.frame, [1280.0, 720.0, 2.0, 120.0]);
    assert_eq!(u.shaft, [0.4, -0.1, 0.8, 0.96]);
    assert_eq!(u.shaft_tail, [0.96, 0.4, 0.62, 1.0]);
    assert_eq!(&u.blur[2..], &[0.7, 0.6]);
    assert_eq!(u.lens, [1.3, 0.012, 0.018, 7.0]);
    assert_eq!(u.screen, [0.12, 1.0, 0.42, 1.15]);
    assert_eq!(u.clip, [0.1, 120.0, 960.0, 1.0]);
}

#[test]
fn missing_stages_are_neutral() {
    let chain = PostChain::new(vec![]).expect("an empty chain is ordered");
    let u = PostUniforms::from_chain(&chain, anchor(), (64, 64), 0.0, (0.1, 10.0));
    // no shafts, no bloom contribution, no grain or vignette
    assert_eq!(u.shaft[2], 0.0);
    assert!(u.blur[2] > 1e6);
    assert_eq!(u.lens[0], 0.0);
    assert_eq!(u.lens[3], 0.0);
    assert_eq!(u.screen, [0.0; 4]);
}

#[test]
fn blur_passes_differ_only_in_direction_and_size() {
    let full = PostUniforms::from_chain(&PostChain::forest(), anchor(), (1280, 720), 1.0, (0.1, 120.0));
    let h = full.at_size((640, 360)).with_blur_dir([1.0, 0.0]);
    let v = full.at_size((640, 360)).with_blur_dir([0.0, 1.0]);
    assert_eq!(&h.frame[..2], &[640.0, 360.0]);
    assert_eq!(&h.blur[..2], &[1.0, 0.0]);
    assert_eq!(&v.blur[..2], &[0.0, 1.0]);
    assert_eq!(h.shaft, v.shaft);
    assert_eq!(h.lens, full.lens);
}

#[test]
fn key_light_frustum_contains_its_target() {
    let rig = LightRig::forest().expect("default rig");
    let vp = key_light_view_projection(&rig.key);
    let t = rig.key.target;
    let clip = vp * Vec4::new(t.x, t.y, t.z, 1.0);
    assert!(clip.w > 0.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < EPS && ndc.y.abs() < EPS, "target at centre, got {ndc:?}");
    assert!(ndc.z > 0.0 && ndc.z < 1.0);
}

#[test]
fn scene_block_carries_the_rig() {
    let rig = LightRig::forest().expect("default rig");
    let vp = glam::Mat4::IDENTITY;
    let u = SceneUniforms::from_lights(vp, Vec3::new(0.0, 1.5, 9.0), 3.0, &rig);
    assert_eq!(u.eye, [0.0, 1.5, 9.0, 3.0]);
    // spot: inner cone narrower than outer
    assert!(u.key_direction[3] > u.key_position[3]);
    assert!((u.key_position[3] - rig.key.angle.cos()).abs() < EPS);
    let dir = Vec3::from_slice(&u.key_direction[..3]);
    assert!((dir.length() - 1.0).abs() < 1e-4);
    assert!((u.key_color[3] - rig.key.distance).abs() < EPS);
    // fog range and the shadow switch
    assert_eq!(u.fog[3], rig.fog.near);
    assert_eq!(u.fog_far[0], rig.fog.far);
    assert_eq!(u.fog_far[2], 1.0);
    assert!((u.fog_far[1] - 1.0 / rig.key.shadow_map_size as f32).abs() < EPS);
}

#[test]
fn graph_uniforms_follow_the_camera() {
    let cfg = SceneConfig::default().with_seed(SeedSource::Fixed(7));
    let mut scene = ForestScene::new(cfg).expect("default scene");
    let graph = scene.update(1.0, 1.0 / 60.0);
    let su = SceneUniforms::from_graph(&graph);
    assert_eq!(su.view_proj, graph.camera.view_projection().to_cols_array_2d());
    assert_eq!(&su.eye[..3], &graph.camera.eye.to_array());
    let pu = PostUniforms::from_graph(&graph, (800, 600));
    assert_eq!(pu.clip[0], graph.camera.znear);
    assert_eq!(pu.clip[1], graph.camera.zfar);
    assert_eq!(pu.shaft[2], graph.shaft_anchor.visibility);
}
