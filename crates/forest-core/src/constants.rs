use glam::Vec3;
use std::f32::consts::PI;

// Shared visual/audio tuning constants used by both web and native frontends.

// Forest layout
pub const FOREST_RADIUS: f32 = 28.0; // outer radius of the floor and of every population
pub const LEAF_COUNT: usize = 420;
pub const DUST_COUNT: usize = 900;
pub const TRUNK_COUNT: usize = 24;
pub const FROND_COUNT: usize = 18;

// Canopy sampling
pub const LEAF_RADIUS_FRACTION: f32 = 0.8; // of FOREST_RADIUS
pub const LEAF_HEIGHT_BASE: f32 = 2.6;
pub const LEAF_HEIGHT_SPAN: f32 = 7.5;
pub const LEAF_SCALE_RANGE: (f32, f32) = (0.45, 1.35);
pub const LEAF_STRETCH_Y: f32 = 1.7; // leaf cards are taller than wide
pub const LEAF_SIZE: (f32, f32) = (1.8, 5.0); // plane width, height
pub const FOLIAGE_PALETTE: [&str; 5] = ["#1e3320", "#233b23", "#274028", "#304a31", "#1b2919"];
pub const CANOPY_BASE_COLOR: &str = "#1f2e1c"; // multiplied with each leaf's palette pick

// Canopy motion
pub const LEAF_DRIFT_AMPLITUDE: [f32; 3] = [0.3, 0.2, 0.25];
pub const LEAF_DRIFT_FREQUENCY: [f32; 3] = [0.1, 0.18, 0.12]; // rad/s per axis
pub const LEAF_SWAY_AMPLITUDE: f32 = 0.3;
pub const LEAF_SWAY_FREQUENCY: f32 = 0.25;
pub const LEAF_SWAY_TILT: f32 = 0.05; // sway share on the x axis
pub const LEAF_SWAY_YAW: f32 = 0.2; // sway share on the y axis
pub const LEAF_ROLL_AMPLITUDE: f32 = 0.05;

// Dust
pub const DUST_RADIUS_FRACTION: f32 = 0.55; // of FOREST_RADIUS
pub const DUST_ORIGIN_HEIGHT: (f32, f32) = (0.8, 5.0);
pub const DUST_SPEED_RANGE: (f32, f32) = (0.3, 1.4);
pub const DUST_DRIFT_RANGE: (f32, f32) = (0.2, 0.65);
pub const DUST_VERTICAL_VELOCITY_RANGE: (f32, f32) = (0.08, 0.25);
pub const DUST_K1: f32 = 0.25; // lateral wander frequency on x
pub const DUST_K2: f32 = 0.18; // lateral wander frequency on z
pub const DUST_UPPER_BOUND: f32 = 6.5;
pub const DUST_RESTART_HEIGHT: (f32, f32) = (0.2, 1.6);
pub const DUST_RESET_JITTER: f32 = 0.3;
pub const DUST_MOTE_SIZE: f32 = 0.08;
pub const DUST_COLOR: &str = "#f4dba5";
pub const DUST_OPACITY: f32 = 0.85;

// Trunks
pub const TRUNK_ANGLE_JITTER: f32 = 0.08;
pub const TRUNK_RADIUS_RANGE: (f32, f32) = (5.0, FOREST_RADIUS * 0.75);
pub const TRUNK_SCALE_RANGE: (f32, f32) = (1.4, 3.6);
pub const TRUNK_RADII: (f32, f32) = (0.35, 0.75); // top, bottom
pub const TRUNK_COLOR: &str = "#3c2a1c";
pub const CROWN_RADIUS: f32 = 0.9;
pub const CROWN_HEIGHT_FACTOR: f32 = 0.9; // of trunk scale, above trunk centre
pub const CROWN_COLOR: &str = "#1f2b19";

// Fronds
pub const FROND_X_RANGE: (f32, f32) = (-4.2, 4.4);
pub const FROND_Z_RANGE: (f32, f32) = (-5.8, -2.4);
pub const FROND_HEIGHT: f32 = 0.15;
pub const FROND_PITCH: f32 = -PI / 2.4;
pub const FROND_YAW_RANGE: (f32, f32) = (-0.4, 0.4);
pub const FROND_ROLL_RANGE: (f32, f32) = (-0.15, 0.15);
pub const FROND_SCALE_RANGE: (f32, f32) = (0.7, 1.6);
pub const FROND_SWAY_AMPLITUDE: f32 = 0.15;
pub const FROND_SWAY_FREQUENCY: f32 = 0.9;
pub const FROND_SIZE: (f32, f32) = (1.8, 4.0);
pub const FROND_COLOR: &str = "#394d2f";

// Camera
pub const CAMERA_START: [f32; 3] = [8.4, 4.6, 13.4];
pub const CAMERA_END: [f32; 3] = [3.7, 3.1, 7.1];
pub const CAMERA_LOOK_AT: [f32; 3] = [0.4, 1.3, 0.0];
pub const CAMERA_RATE: f32 = 0.22; // progress per second
pub const CAMERA_BOB_AMPLITUDE: f32 = 0.08;
pub const CAMERA_BOB_FREQUENCY: f32 = 0.6;
pub const CAMERA_FOV_DEGREES: f32 = 35.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 150.0;

// Wings
pub const WING_BASE_ANGLE: f32 = PI / 2.8;
pub const WING_FLAP_AMPLITUDE: f32 = 0.18;
pub const WING_FLAP_FREQUENCY: f32 = 0.8;

// Atmosphere
pub const BACKGROUND_COLOR: &str = "#060507";
pub const FOG_COLOR: &str = "#0c0907";
pub const FOG_RANGE: (f32, f32) = (12.0, 48.0);

// Audio
pub const NOISE_SECONDS: f32 = 2.0;
pub const BROWN_LEAK: f32 = 1.02;
pub const BROWN_STEP: f32 = 0.02;
pub const BROWN_OUTPUT_GAIN: f32 = 0.6;
pub const WIND_FILTER_HZ: f32 = 320.0;
pub const WIND_FILTER_Q: f32 = 0.8;
pub const WIND_GAIN: f32 = 0.28;
pub const RESONANCE_HZ: f32 = 172.0;
pub const CHIME_HZ: f32 = 1024.0;
pub const CHIME_HIGHPASS_HZ: f32 = 850.0;
pub const CHIME_HIGHPASS_Q: f32 = 1.6;
pub const MASTER_TARGET: f32 = 0.7;
pub const SETTLE_TIME_CONSTANTS: f64 = 5.0; // approach counts as settled after 5 tau
pub const BREAKPOINT_SPACING_SEC: f64 = 0.1; // lowering step for host automation

#[inline]
pub fn camera_look_at() -> Vec3 {
    Vec3::from(CAMERA_LOOK_AT)
}
