//! Scene configuration gathered from the tuning constants.
//!
//! Everything here is plain data with a `Default` that reproduces the
//! reference tableau. `SceneConfig::validate` runs before any population is
//! built so that sampling itself never has to fail.

use crate::constants::*;
use crate::error::ConfigError;
use crate::material::parse_hex_color;
use rand::Rng;

/// Closed-open sampling interval `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn from_pair(pair: (f32, f32)) -> Self {
        Self::new(pair.0, pair.1)
    }

    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        self.lerp(rng.gen::<f32>())
    }

    #[inline]
    pub fn contains(&self, v: f32) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        finite(field, self.min)?;
        finite(field, self.max)?;
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

pub(crate) fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

pub(crate) fn non_empty(population: &'static str, count: usize) -> Result<(), ConfigError> {
    if count == 0 {
        Err(ConfigError::EmptyPopulation { population })
    } else {
        Ok(())
    }
}

/// Where sampling randomness comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedSource {
    /// Fresh OS entropy each construction.
    #[default]
    Entropy,
    Fixed(u64),
}

#[derive(Clone, Debug)]
pub struct CanopyConfig {
    pub count: usize,
    pub radius_fraction: f32,
    pub height: Span,
    pub scale: Span,
    pub palette: Vec<&'static str>,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            count: LEAF_COUNT,
            radius_fraction: LEAF_RADIUS_FRACTION,
            height: Span::new(LEAF_HEIGHT_BASE, LEAF_HEIGHT_BASE + LEAF_HEIGHT_SPAN),
            scale: Span::from_pair(LEAF_SCALE_RANGE),
            palette: FOLIAGE_PALETTE.to_vec(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DustConfig {
    pub count: usize,
    pub radius_fraction: f32,
    pub origin_height: Span,
    pub speed: Span,
    pub drift: Span,
    pub vertical_velocity: Span,
    pub bounds: DustBounds,
}

/// Motion and recycling parameters for the dust recycler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DustBounds {
    pub upper_bound: f32,
    pub restart_height: Span,
    pub jitter: f32,
    pub k1: f32,
    pub k2: f32,
}

impl Default for DustBounds {
    fn default() -> Self {
        Self {
            upper_bound: DUST_UPPER_BOUND,
            restart_height: Span::from_pair(DUST_RESTART_HEIGHT),
            jitter: DUST_RESET_JITTER,
            k1: DUST_K1,
            k2: DUST_K2,
        }
    }
}

impl DustBounds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        finite("dust.upper_bound", self.upper_bound)?;
        finite("dust.jitter", self.jitter)?;
        finite("dust.k1", self.k1)?;
        finite("dust.k2", self.k2)?;
        self.restart_height.validate("dust.restart_height")?;
        if self.restart_height.max >= self.upper_bound {
            return Err(ConfigError::DustBounds(format!(
                "restart band tops out at {} which is not below the upper bound {}",
                self.restart_height.max, self.upper_bound
            )));
        }
        Ok(())
    }
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            count: DUST_COUNT,
            radius_fraction: DUST_RADIUS_FRACTION,
            origin_height: Span::from_pair(DUST_ORIGIN_HEIGHT),
            speed: Span::from_pair(DUST_SPEED_RANGE),
            drift: Span::from_pair(DUST_DRIFT_RANGE),
            vertical_velocity: Span::from_pair(DUST_VERTICAL_VELOCITY_RANGE),
            bounds: DustBounds::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TrunkConfig {
    pub count: usize,
    pub angle_jitter: f32,
    pub radius: Span,
    pub scale: Span,
}

impl Default for TrunkConfig {
    fn default() -> Self {
        Self {
            count: TRUNK_COUNT,
            angle_jitter: TRUNK_ANGLE_JITTER,
            radius: Span::from_pair(TRUNK_RADIUS_RANGE),
            scale: Span::from_pair(TRUNK_SCALE_RANGE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FrondConfig {
    pub count: usize,
    pub x: Span,
    pub z: Span,
    pub height: f32,
    pub pitch: f32,
    pub yaw: Span,
    pub roll: Span,
    pub scale: Span,
}

impl Default for FrondConfig {
    fn default() -> Self {
        Self {
            count: FROND_COUNT,
            x: Span::from_pair(FROND_X_RANGE),
            z: Span::from_pair(FROND_Z_RANGE),
            height: FROND_HEIGHT,
            pitch: FROND_PITCH,
            yaw: Span::from_pair(FROND_YAW_RANGE),
            roll: Span::from_pair(FROND_ROLL_RANGE),
            scale: Span::from_pair(FROND_SCALE_RANGE),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub forest_radius: f32,
    pub canopy: CanopyConfig,
    pub dust: DustConfig,
    pub trunks: TrunkConfig,
    pub fronds: FrondConfig,
    pub seed: SeedSource,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            forest_radius: FOREST_RADIUS,
            canopy: CanopyConfig::default(),
            dust: DustConfig::default(),
            trunks: TrunkConfig::default(),
            fronds: FrondConfig::default(),
            seed: SeedSource::Entropy,
        }
    }
}

impl SceneConfig {
    pub fn with_seed(mut self, seed: SeedSource) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("forest_radius", self.forest_radius)?;

        let c = &self.canopy;
        non_empty("canopy", c.count)?;
        finite("canopy.radius_fraction", c.radius_fraction)?;
        c.height.validate("canopy.height")?;
        c.scale.validate("canopy.scale")?;
        if c.palette.is_empty() {
            return Err(ConfigError::EmptyPopulation {
                population: "canopy.palette",
            });
        }
        for hex in &c.palette {
            parse_hex_color(hex)?;
        }

        let d = &self.dust;
        non_empty("dust", d.count)?;
        finite("dust.radius_fraction", d.radius_fraction)?;
        d.origin_height.validate("dust.origin_height")?;
        d.speed.validate("dust.speed")?;
        d.drift.validate("dust.drift")?;
        d.vertical_velocity.validate("dust.vertical_velocity")?;
        d.bounds.validate()?;
        if d.origin_height.max >= d.bounds.upper_bound {
            return Err(ConfigError::DustBounds(format!(
                "origins reach {} which is not below the upper bound {}",
                d.origin_height.max, d.bounds.upper_bound
            )));
        }

        let t = &self.trunks;
        non_empty("trunks", t.count)?;
        finite("trunks.angle_jitter", t.angle_jitter)?;
        t.radius.validate("trunks.radius")?;
        t.scale.validate("trunks.scale")?;

        let f = &self.fronds;
        non_empty("fronds", f.count)?;
        f.x.validate("fronds.x")?;
        f.z.validate("fronds.z")?;
        finite("fronds.height", f.height)?;
        finite("fronds.pitch", f.pitch)?;
        f.yaw.validate("fronds.yaw")?;
        f.roll.validate("fronds.roll")?;
        f.scale.validate("fronds.scale")?;
        Ok(())
    }
}
