//! Parametric primitives and their CPU tessellation.
//!
//! Conventions follow the usual scene-graph defaults: planes, circles and
//! rings lie in XY facing +Z, revolved shapes are centred on the origin and
//! revolve around Y, the torus lies in XY around Z.

use fnv::FnvHasher;
use glam::Vec3;
use std::f32::consts::{PI, TAU};
use std::hash::Hasher;

const ROUND_SEGMENTS: u32 = 24;
const ROUND_STACKS: u32 = 16;
const TORUS_TUBE_SEGMENTS: u32 = 12;
const TUBE_RADIAL_SEGMENTS: u32 = 8;
const CATMULL_ROM_TENSION: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Plane { width: f32, height: f32 },
    Circle { radius: f32 },
    Ring { inner: f32, outer: f32 },
    Sphere { radius: f32 },
    Capsule { radius: f32, length: f32 },
    Cylinder { top: f32, bottom: f32, height: f32, segments: u32 },
    Cone { radius: f32, height: f32 },
    Torus { radius: f32, tube: f32 },
    Tube { points: Vec<Vec3>, radius: f32, segments: u32 },
    Mote { size: f32 },
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push(&mut self, p: Vec3, n: Vec3) -> u32 {
        let i = self.positions.len() as u32;
        self.positions.push(p.to_array());
        self.normals.push(n.normalize_or_zero().to_array());
        i
    }

    /// Quads between consecutive rows of a (rows x cols) vertex grid.
    fn grid(&mut self, base: u32, rows: u32, cols: u32) {
        for r in 0..rows - 1 {
            for c in 0..cols - 1 {
                let a = base + r * cols + c;
                let b = a + cols;
                self.indices.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
            }
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut it = self.positions.iter().map(|p| Vec3::from(*p));
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

impl Shape {
    /// Stable identity used to share one GPU mesh between batches.
    pub fn cache_key(&self) -> u64 {
        let mut h = FnvHasher::default();
        let mut f = |v: f32| h.write_u32(v.to_bits());
        match self {
            Shape::Plane { width, height } => {
                f(0.0);
                f(*width);
                f(*height);
            }
            Shape::Circle { radius } => {
                f(1.0);
                f(*radius);
            }
            Shape::Ring { inner, outer } => {
                f(2.0);
                f(*inner);
                f(*outer);
            }
            Shape::Sphere { radius } => {
                f(3.0);
                f(*radius);
            }
            Shape::Capsule { radius, length } => {
                f(4.0);
                f(*radius);
                f(*length);
            }
            Shape::Cylinder { top, bottom, height, segments } => {
                f(5.0);
                f(*top);
                f(*bottom);
                f(*height);
                f(*segments as f32);
            }
            Shape::Cone { radius, height } => {
                f(6.0);
                f(*radius);
                f(*height);
            }
            Shape::Torus { radius, tube } => {
                f(7.0);
                f(*radius);
                f(*tube);
            }
            Shape::Tube { points, radius, segments } => {
                f(8.0);
                for p in points {
                    f(p.x);
                    f(p.y);
                    f(p.z);
                }
                f(*radius);
                f(*segments as f32);
            }
            Shape::Mote { size } => {
                f(9.0);
                f(*size);
            }
        }
        h.finish()
    }

    pub fn tessellate(&self) -> MeshData {
        match self {
            Shape::Plane { width, height } => plane(*width, *height),
            Shape::Circle { radius } => ring(0.0, *radius),
            Shape::Ring { inner, outer } => ring(*inner, *outer),
            Shape::Sphere { radius } => lathe(&sphere_profile(*radius, 0.0, 0.0, PI), ROUND_SEGMENTS),
            Shape::Capsule { radius, length } => {
                let half = length / 2.0;
                let mut profile = sphere_profile(*radius, half, 0.0, PI / 2.0);
                profile.extend(sphere_profile(*radius, -half, PI / 2.0, PI));
                lathe(&profile, ROUND_SEGMENTS)
            }
            Shape::Cylinder { top, bottom, height, segments } => {
                lathe(&frustum_profile(*top, *bottom, *height), (*segments).max(3))
            }
            Shape::Cone { radius, height } => {
                lathe(&frustum_profile(0.0, *radius, *height), ROUND_SEGMENTS)
            }
            Shape::Torus { radius, tube } => torus(*radius, *tube),
            Shape::Tube { points, radius, segments } => tube(points, *radius, *segments),
            Shape::Mote { size } => mote(size / 2.0),
        }
    }
}

/// (radius, y, normal) rows revolved around Y.
type ProfileRow = (f32, f32, [f32; 2]);

fn sphere_profile(radius: f32, centre_y: f32, from: f32, to: f32) -> Vec<ProfileRow> {
    (0..=ROUND_STACKS / 2)
        .map(|i| {
            let theta = from + (to - from) * i as f32 / (ROUND_STACKS / 2) as f32;
            let (s, c) = theta.sin_cos();
            (radius * s, centre_y + radius * c, [s, c])
        })
        .collect()
}

fn frustum_profile(top: f32, bottom: f32, height: f32) -> Vec<ProfileRow> {
    let half = height / 2.0;
    let side = [height, bottom - top];
    vec![
        (0.0, half, [0.0, 1.0]),
        (top, half, [0.0, 1.0]),
        (top, half, side),
        (bottom, -half, side),
        (bottom, -half, [0.0, -1.0]),
        (0.0, -half, [0.0, -1.0]),
    ]
}

fn lathe(profile: &[ProfileRow], segments: u32) -> MeshData {
    let mut m = MeshData::default();
    let cols = segments + 1;
    for &(r, y, [nr, ny]) in profile {
        for j in 0..cols {
            let phi = TAU * j as f32 / segments as f32;
            let (s, c) = phi.sin_cos();
            m.push(Vec3::new(r * c, y, r * s), Vec3::new(nr * c, ny, nr * s));
        }
    }
    m.grid(0, profile.len() as u32, cols);
    m
}

fn plane(width: f32, height: f32) -> MeshData {
    let mut m = MeshData::default();
    let (hw, hh) = (width / 2.0, height / 2.0);
    for y in [hh, -hh] {
        for x in [-hw, hw] {
            m.push(Vec3::new(x, y, 0.0), Vec3::Z);
        }
    }
    m.grid(0, 2, 2);
    m
}

fn ring(inner: f32, outer: f32) -> MeshData {
    let mut m = MeshData::default();
    let cols = ROUND_SEGMENTS * 2 + 1;
    for r in [inner, outer] {
        for j in 0..cols {
            let phi = TAU * j as f32 / (cols - 1) as f32;
            m.push(Vec3::new(r * phi.cos(), r * phi.sin(), 0.0), Vec3::Z);
        }
    }
    m.grid(0, 2, cols);
    m
}

fn torus(radius: f32, tube: f32) -> MeshData {
    let mut m = MeshData::default();
    let around = ROUND_SEGMENTS * 2;
    let cols = around + 1;
    for i in 0..=TORUS_TUBE_SEGMENTS {
        let v = TAU * i as f32 / TORUS_TUBE_SEGMENTS as f32;
        for j in 0..cols {
            let u = TAU * j as f32 / around as f32;
            let ring_r = radius + tube * v.cos();
            let p = Vec3::new(ring_r * u.cos(), ring_r * u.sin(), tube * v.sin());
            let n = Vec3::new(v.cos() * u.cos(), v.cos() * u.sin(), v.sin());
            m.push(p, n);
        }
    }
    m.grid(0, TORUS_TUBE_SEGMENTS + 1, cols);
    m
}

fn tube(points: &[Vec3], radius: f32, segments: u32) -> MeshData {
    let mut m = MeshData::default();
    let segments = segments.max(1);
    let curve = CatmullRom::new(points);
    let samples: Vec<Vec3> = (0..=segments)
        .map(|i| curve.point(i as f32 / segments as f32))
        .collect();
    let cols = TUBE_RADIAL_SEGMENTS + 1;
    for (i, p) in samples.iter().enumerate() {
        let prev = samples[i.saturating_sub(1)];
        let next = samples[(i + 1).min(samples.len() - 1)];
        let tangent = (next - prev).normalize_or_zero();
        let reference = if tangent.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
        let normal = tangent.cross(reference).normalize_or_zero();
        let binormal = tangent.cross(normal);
        for j in 0..cols {
            let a = TAU * j as f32 / TUBE_RADIAL_SEGMENTS as f32;
            let dir = normal * a.cos() + binormal * a.sin();
            m.push(*p + dir * radius, dir);
        }
    }
    m.grid(0, samples.len() as u32, cols);
    m
}

fn mote(radius: f32) -> MeshData {
    let mut m = MeshData::default();
    let axes = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
    for a in axes {
        m.push(a * radius, a);
    }
    // +x/-x = 0/1, +y/-y = 2/3, +z/-z = 4/5
    for &(x, y, z) in &[(0, 2, 4), (4, 2, 1), (1, 2, 5), (5, 2, 0)] {
        m.indices.extend_from_slice(&[x, y, z, x, z, y + 1]);
    }
    m
}

/// Open uniform Catmull-Rom spline with mirrored end points. Tangents are
/// `tension * (next - prev)`.
pub struct CatmullRom<'a> {
    points: &'a [Vec3],
    tension: f32,
}

impl<'a> CatmullRom<'a> {
    pub fn new(points: &'a [Vec3]) -> Self {
        Self::with_tension(points, CATMULL_ROM_TENSION)
    }

    pub fn with_tension(points: &'a [Vec3], tension: f32) -> Self {
        Self { points, tension }
    }

    /// Point at `t` in `[0, 1]` along the whole curve.
    pub fn point(&self, t: f32) -> Vec3 {
        let pts = self.points;
        match pts.len() {
            0 => return Vec3::ZERO,
            1 => return pts[0],
            _ => {}
        }
        let n = pts.len();
        let p = (n - 1) as f32 * t.clamp(0.0, 1.0);
        let mut seg = p.floor() as usize;
        let mut w = p - seg as f32;
        if seg >= n - 1 {
            seg = n - 2;
            w = 1.0;
        }
        let p1 = pts[seg];
        let p2 = pts[seg + 1];
        let p0 = if seg > 0 { pts[seg - 1] } else { p1 * 2.0 - p2 };
        let p3 = if seg + 2 < n { pts[seg + 2] } else { p2 * 2.0 - p1 };

        let t1 = (p2 - p0) * self.tension;
        let t2 = (p3 - p1) * self.tension;
        let c2 = p1 * -3.0 + p2 * 3.0 - t1 * 2.0 - t2;
        let c3 = p1 * 2.0 - p2 * 2.0 + t1 + t2;
        p1 + t1 * w + c2 * (w * w) + c3 * (w * w * w)
    }
}
