use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::{
    core::{StepParams, StoreParams},
    graph::{GraphParams, GraphStrategy},
    types::Rgba,
};

pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const MAX_TICKS_PER_FRAME: u32 = 8;

/// Surface units covered by one terminal cell.
pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

pub const PARTICLE_COUNT: usize = 50;
pub const INITIAL_SPEED: f32 = 1.0;
pub const RADIUS_MIN: f32 = 2.0;
pub const RADIUS_MAX: f32 = 4.0;
pub const PULSE_PHASE_SPEED_MIN: f32 = 0.02;
pub const PULSE_PHASE_SPEED_MAX: f32 = 0.08;
pub const PULSE_AMPLITUDE_MIN: f32 = 0.1;
pub const PULSE_AMPLITUDE_MAX: f32 = 0.3;

pub const PALETTE: [Rgba; 3] = [
    Rgba::opaque(0x9b, 0x87, 0xf5),
    Rgba::opaque(0xd9, 0x46, 0xef),
    Rgba::opaque(0x8b, 0x5c, 0xf6),
];

pub const INTERACTION_RADIUS: f32 = 100.0;
pub const ATTRACTION: f32 = 0.004;
pub const AMBIENT_STRENGTH: f32 = 0.01;
pub const AMBIENT_FREQUENCY: f32 = 0.01;
pub const AMBIENT_SCALE: f32 = 0.01;
pub const RESTITUTION: f32 = 0.8;
pub const DAMPING: f32 = 0.99;

pub const CONNECTION_DISTANCE: f32 = 100.0;
pub const MAX_OPACITY: f32 = 0.2;

pub const SPARKLE_CAPACITY: usize = 256;
pub const SPARKLE_CHANCE: f64 = 0.5;
pub const SPARKLE_JITTER: f32 = 20.0;
pub const SPARKLE_SIZE_MIN: f32 = 1.0;
pub const SPARKLE_SIZE_MAX: f32 = 4.0;
pub const SPARKLE_FADE_PER_SECOND: f32 = 1.0;
pub const SPARKLE_COLOR: Rgba = Rgba::opaque(0xff, 0xd7, 0x00);

/// Upper bound for lengths and speeds read from a config file.
pub const MAX_TUNABLE: f32 = 1.0e6;

pub const HEADLESS_WIDTH: f32 = 800.0;
pub const HEADLESS_HEIGHT: f32 = 600.0;

/// Runtime tunables. Every field falls back to the constant above, so a YAML
/// file only needs the keys it changes:
///
/// ```yaml
/// particle_count: 120
/// restitution: 0.6
/// graph: grid
/// seed: 7
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FieldConfig {
    pub particle_count: usize,
    pub initial_speed: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub pulse: bool,
    pub interaction_radius: f32,
    pub attraction: f32,
    pub ambient_strength: f32,
    pub ambient_frequency: f32,
    pub ambient_scale: f32,
    pub restitution: f32,
    pub damping: f32,
    pub connection_distance: f32,
    pub max_opacity: f32,
    pub graph: GraphStrategy,
    pub sparkles: bool,
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            initial_speed: INITIAL_SPEED,
            radius_min: RADIUS_MIN,
            radius_max: RADIUS_MAX,
            pulse: true,
            interaction_radius: INTERACTION_RADIUS,
            attraction: ATTRACTION,
            ambient_strength: AMBIENT_STRENGTH,
            ambient_frequency: AMBIENT_FREQUENCY,
            ambient_scale: AMBIENT_SCALE,
            restitution: RESTITUTION,
            damping: DAMPING,
            connection_distance: CONNECTION_DISTANCE,
            max_opacity: MAX_OPACITY,
            graph: GraphStrategy::BruteForce,
            sparkles: true,
            seed: None,
        }
    }
}

impl FieldConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: FieldConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 {
            bail!("particle_count must be at least 1");
        }
        let tunables = [
            ("initial_speed", self.initial_speed),
            ("radius_min", self.radius_min),
            ("radius_max", self.radius_max),
            ("interaction_radius", self.interaction_radius),
            ("attraction", self.attraction),
            ("ambient_strength", self.ambient_strength),
            ("ambient_frequency", self.ambient_frequency),
            ("ambient_scale", self.ambient_scale),
            ("restitution", self.restitution),
            ("damping", self.damping),
            ("connection_distance", self.connection_distance),
            ("max_opacity", self.max_opacity),
        ];
        for (name, value) in tunables {
            if !value.is_finite() {
                bail!("{name} must be finite, got {value}");
            }
        }
        if !(self.radius_min > 0.0 && self.radius_min < self.radius_max) {
            bail!(
                "radius range must satisfy 0 < radius_min < radius_max (got {}..{})",
                self.radius_min,
                self.radius_max
            );
        }
        if self.radius_max > MAX_TUNABLE {
            bail!("radius_max must be at most {MAX_TUNABLE}, got {}", self.radius_max);
        }
        if !(0.0..=MAX_TUNABLE).contains(&self.initial_speed) {
            bail!(
                "initial_speed must be in [0, {MAX_TUNABLE}], got {}",
                self.initial_speed
            );
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            bail!("damping must be in (0, 1), got {}", self.damping);
        }
        if !(self.restitution >= 0.0 && self.restitution < 1.0) {
            bail!("restitution must be in [0, 1), got {}", self.restitution);
        }
        if !(self.interaction_radius > 0.0) {
            bail!("interaction_radius must be positive");
        }
        if !(self.connection_distance > 0.0) {
            bail!("connection_distance must be positive");
        }
        if !(0.0..=1.0).contains(&self.max_opacity) {
            bail!("max_opacity must be in [0, 1], got {}", self.max_opacity);
        }
        Ok(())
    }

    pub fn store_params(&self) -> StoreParams {
        StoreParams {
            count: self.particle_count,
            initial_speed: self.initial_speed,
            radius_min: self.radius_min,
            radius_max: self.radius_max,
            pulse: self.pulse,
        }
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            interaction_radius: self.interaction_radius,
            attraction: self.attraction,
            ambient_strength: self.ambient_strength,
            ambient_frequency: self.ambient_frequency,
            ambient_scale: self.ambient_scale,
            restitution: self.restitution,
            damping: self.damping,
        }
    }

    pub fn graph_params(&self) -> GraphParams {
        GraphParams {
            connection_distance: self.connection_distance,
            max_opacity: self.max_opacity,
        }
    }
}
