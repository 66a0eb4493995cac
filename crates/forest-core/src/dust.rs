//! Rising dust motes, recycled near their origin when they pass the ceiling.

use crate::config::DustBounds;
use crate::error::ConfigError;
use crate::geometry::Shape;
use crate::instance::{DrawBatch, Transform};
use crate::material::Material;
use crate::sampler::DustSample;
use glam::Vec3;
use rand::rngs::StdRng;

pub struct DustField {
    samples: Vec<DustSample>,
    positions: Vec<Vec3>,
    bounds: DustBounds,
    rng: StdRng,
    recycled_last_step: usize,
    recycled_total: u64,
}

impl DustField {
    /// Particles start at their origins. Origins at or above the ceiling are
    /// rejected, as are restart heights that could land there.
    pub fn new(
        samples: Vec<DustSample>,
        bounds: DustBounds,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        if samples.is_empty() {
            return Err(ConfigError::EmptyPopulation { population: "dust" });
        }
        bounds.validate()?;
        if let Some(s) = samples
            .iter()
            .find(|s| !s.origin.is_finite() || s.origin.y >= bounds.upper_bound)
        {
            return Err(ConfigError::DustBounds(format!(
                "origin {:?} is not below the upper bound {}",
                s.origin, bounds.upper_bound
            )));
        }
        let positions = samples.iter().map(|s| s.origin).collect();
        Ok(Self {
            samples,
            positions,
            bounds,
            rng,
            recycled_last_step: 0,
            recycled_total: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn samples(&self) -> &[DustSample] {
        &self.samples
    }

    pub fn bounds(&self) -> &DustBounds {
        &self.bounds
    }

    pub fn recycled_last_step(&self) -> usize {
        self.recycled_last_step
    }

    pub fn recycled_total(&self) -> u64 {
        self.recycled_total
    }

    /// Integrate one frame. Any particle past the ceiling is reset before
    /// this returns, so published positions are always below it.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let b = self.bounds;
        let mut recycled = 0;
        for (i, (pos, s)) in self.positions.iter_mut().zip(&self.samples).enumerate() {
            let fi = i as f32;
            pos.x += ((pos.y + fi) * b.k1).sin() * dt;
            pos.y += s.vertical_velocity * dt * s.speed;
            pos.z += ((pos.x + fi) * b.k2).cos() * dt * s.drift;
            if pos.y >= b.upper_bound || !pos.is_finite() {
                pos.x = s.origin.x + fi.sin() * b.jitter;
                pos.y = b.restart_height.sample(&mut self.rng);
                pos.z = s.origin.z + fi.cos() * b.jitter;
                recycled += 1;
            }
        }
        self.recycled_last_step = recycled;
        self.recycled_total += recycled as u64;
        if recycled > 0 {
            log::debug!("dust: recycled {} motes ({} total)", recycled, self.recycled_total);
        }
    }

    pub fn build_batch(&self, size: f32, material: Material) -> DrawBatch {
        let mut batch = DrawBatch::new("dust", Shape::Mote { size }, material);
        for p in &self.positions {
            batch.push(Transform::at(*p).to_matrix());
        }
        batch
    }

    pub fn publish(&self, batch: &mut DrawBatch) {
        for (raw, p) in batch.instances.iter_mut().zip(&self.positions) {
            raw.set_model(Transform::at(*p).to_matrix());
        }
    }
}
