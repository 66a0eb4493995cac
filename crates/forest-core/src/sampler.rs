//! Bounded random parameter sets for every population.
//!
//! Sampling happens once per population at scene construction. Each
//! population draws from its own stream derived from the base seed, so
//! changing one population's size does not reshuffle the others.

use crate::config::{
    non_empty, positive, CanopyConfig, DustConfig, FrondConfig, SeedSource, Span, TrunkConfig,
};
use crate::error::ConfigError;
use crate::material::parse_hex_color;
use glam::Vec3;
use rand::prelude::*;
use std::f32::consts::TAU;

const CANOPY_STREAM: u64 = 0;
const DUST_STREAM: u64 = 1;
const TRUNK_STREAM: u64 = 2;
const FROND_STREAM: u64 = 3;
const RECYCLE_STREAM: u64 = 4;

/// One leaf card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceSample {
    pub position: Vec3,
    pub scale: f32,
    pub rotation_seed: f32,
    pub phase: f32,
    pub color: [f32; 3],
}

/// Reset parameters of one dust mote.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DustSample {
    pub origin: Vec3,
    pub speed: f32,
    pub drift: f32,
    pub vertical_velocity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrunkPlacement {
    pub position: Vec3,
    pub rotation: f32, // yaw
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrondPlacement {
    pub position: Vec3,
    pub rotation: Vec3, // XYZ euler
    pub scale: f32,
    pub phase: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct Sampler {
    seed: SeedSource,
}

impl Sampler {
    pub fn new(seed: SeedSource) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> SeedSource {
        self.seed
    }

    /// Independent generator for one population stream.
    pub fn stream(&self, index: u64) -> StdRng {
        match self.seed {
            SeedSource::Entropy => StdRng::from_entropy(),
            SeedSource::Fixed(seed) => {
                let mix = seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                StdRng::seed_from_u64(mix)
            }
        }
    }

    pub fn recycle_stream(&self) -> StdRng {
        self.stream(RECYCLE_STREAM)
    }

    pub fn canopy(
        &self,
        cfg: &CanopyConfig,
        forest_radius: f32,
    ) -> Result<Vec<InstanceSample>, ConfigError> {
        non_empty("canopy", cfg.count)?;
        positive("forest_radius", forest_radius)?;
        cfg.height.validate("canopy.height")?;
        cfg.scale.validate("canopy.scale")?;
        let palette = cfg
            .palette
            .iter()
            .map(|hex| parse_hex_color(hex))
            .collect::<Result<Vec<_>, _>>()?;
        if palette.is_empty() {
            return Err(ConfigError::EmptyPopulation {
                population: "canopy.palette",
            });
        }
        let radial = radial_span("canopy.radius_fraction", forest_radius, cfg.radius_fraction)?;
        let mut rng = self.stream(CANOPY_STREAM);
        let samples = (0..cfg.count)
            .map(|_| {
                let angle = rng.gen::<f32>() * TAU;
                let radius = radial.sample(&mut rng);
                let height = cfg.height.sample(&mut rng);
                InstanceSample {
                    position: Vec3::new(angle.cos() * radius, height, angle.sin() * radius),
                    scale: cfg.scale.sample(&mut rng),
                    rotation_seed: rng.gen::<f32>() * TAU,
                    phase: rng.gen::<f32>() * TAU,
                    color: palette[rng.gen_range(0..palette.len())],
                }
            })
            .collect();
        Ok(samples)
    }

    pub fn dust(
        &self,
        cfg: &DustConfig,
        forest_radius: f32,
    ) -> Result<Vec<DustSample>, ConfigError> {
        non_empty("dust", cfg.count)?;
        positive("forest_radius", forest_radius)?;
        cfg.origin_height.validate("dust.origin_height")?;
        cfg.speed.validate("dust.speed")?;
        cfg.drift.validate("dust.drift")?;
        cfg.vertical_velocity.validate("dust.vertical_velocity")?;
        let radial = radial_span("dust.radius_fraction", forest_radius, cfg.radius_fraction)?;
        let mut rng = self.stream(DUST_STREAM);
        let samples = (0..cfg.count)
            .map(|_| {
                let angle = rng.gen::<f32>() * TAU;
                let radius = radial.sample(&mut rng);
                let height = cfg.origin_height.sample(&mut rng);
                DustSample {
                    origin: Vec3::new(angle.cos() * radius, height, angle.sin() * radius),
                    speed: cfg.speed.sample(&mut rng),
                    drift: cfg.drift.sample(&mut rng),
                    vertical_velocity: cfg.vertical_velocity.sample(&mut rng),
                }
            })
            .collect();
        Ok(samples)
    }

    /// Trunks ring the clearing: evenly spaced angles with a little jitter.
    pub fn trunks(&self, cfg: &TrunkConfig) -> Result<Vec<TrunkPlacement>, ConfigError> {
        non_empty("trunks", cfg.count)?;
        cfg.radius.validate("trunks.radius")?;
        cfg.scale.validate("trunks.scale")?;
        let mut rng = self.stream(TRUNK_STREAM);
        let n = cfg.count as f32;
        let placements = (0..cfg.count)
            .map(|i| {
                let angle = (i as f32 / n) * TAU + rng.gen::<f32>() * cfg.angle_jitter;
                let radius = cfg.radius.sample(&mut rng);
                let scale = cfg.scale.sample(&mut rng);
                TrunkPlacement {
                    position: Vec3::new(angle.cos() * radius, scale / 2.0, angle.sin() * radius),
                    rotation: rng.gen::<f32>() * TAU,
                    scale,
                }
            })
            .collect();
        Ok(placements)
    }

    pub fn fronds(&self, cfg: &FrondConfig) -> Result<Vec<FrondPlacement>, ConfigError> {
        non_empty("fronds", cfg.count)?;
        cfg.x.validate("fronds.x")?;
        cfg.z.validate("fronds.z")?;
        cfg.yaw.validate("fronds.yaw")?;
        cfg.roll.validate("fronds.roll")?;
        cfg.scale.validate("fronds.scale")?;
        let mut rng = self.stream(FROND_STREAM);
        let placements = (0..cfg.count)
            .map(|i| {
                let position = Vec3::new(cfg.x.sample(&mut rng), cfg.height, cfg.z.sample(&mut rng));
                let rotation = Vec3::new(cfg.pitch, cfg.yaw.sample(&mut rng), cfg.roll.sample(&mut rng));
                FrondPlacement {
                    position,
                    rotation,
                    scale: cfg.scale.sample(&mut rng),
                    phase: rng.gen::<f32>() * TAU + i as f32,
                }
            })
            .collect();
        Ok(placements)
    }
}

fn radial_span(field: &'static str, forest_radius: f32, fraction: f32) -> Result<Span, ConfigError> {
    let span = Span::new(0.0, forest_radius * fraction);
    span.validate(field)?;
    Ok(span)
}
