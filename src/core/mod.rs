use log::{debug, info};
use std::f64::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::{self, FieldConfig},
    graph::{GraphBuilder, GraphParams},
    types::{Edge, FieldStats, Particle, Pulse, Sparkle, Vec2, Viewport},
};

#[derive(Clone, Copy, Debug)]
pub struct StoreParams {
    pub count: usize,
    pub initial_speed: f32,
    pub radius_min: f32,
    pub radius_max: f32,
    pub pulse: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct StepParams {
    pub interaction_radius: f32,
    pub attraction: f32,
    pub ambient_strength: f32,
    pub ambient_frequency: f32,
    pub ambient_scale: f32,
    pub restitution: f32,
    pub damping: f32,
}

/// Everything a particle step reads besides the particle itself, captured
/// once at the start of a tick.
#[derive(Clone, Copy, Debug)]
pub struct StepContext {
    pub cursor: Option<Vec2>,
    pub viewport: Viewport,
    /// Tick counter; f64 keeps whole ticks exact far beyond what f32 can.
    pub time: f64,
}

/// Samples a fresh particle set. The viewport must be valid.
pub fn initialize<R: Rng + ?Sized>(
    viewport: Viewport,
    params: &StoreParams,
    rng: &mut R,
) -> Vec<Particle> {
    debug_assert!(viewport.is_valid(), "initialize() needs a valid viewport");
    (0..params.count)
        .map(|_| {
            let pos = Vec2::new(
                rng.gen_range(0.0..=viewport.width),
                rng.gen_range(0.0..=viewport.height),
            );
            let vel = if params.initial_speed > 0.0 {
                Vec2::new(
                    rng.gen_range(-params.initial_speed..params.initial_speed),
                    rng.gen_range(-params.initial_speed..params.initial_speed),
                )
            } else {
                Vec2::ZERO
            };
            let radius = rng.gen_range(params.radius_min..params.radius_max);
            let color = config::PALETTE[rng.gen_range(0..config::PALETTE.len())];
            let pulse = params.pulse.then(|| Pulse {
                phase_speed: rng
                    .gen_range(config::PULSE_PHASE_SPEED_MIN..config::PULSE_PHASE_SPEED_MAX),
                amplitude: rng.gen_range(config::PULSE_AMPLITUDE_MIN..config::PULSE_AMPLITUDE_MAX),
            });
            Particle {
                pos,
                vel,
                radius,
                color,
                pulse,
            }
        })
        .collect()
}

/// Advances one particle by one tick. Forces are applied before integration,
/// so a particle leaving the bounds bounces with its pre-clamp velocity.
pub fn step_particle(particle: &Particle, ctx: &StepContext, params: &StepParams) -> Particle {
    let mut pos = particle.pos;
    let mut vel = particle.vel;

    if let Some(cursor) = ctx.cursor {
        let delta = cursor - pos;
        let dist = delta.length();
        if dist < params.interaction_radius {
            let falloff = 1.0 - dist / params.interaction_radius;
            vel += delta * (params.attraction * falloff);
        }
    }

    if params.ambient_strength != 0.0 {
        let phase = (ctx.time * params.ambient_frequency as f64).rem_euclid(TAU) as f32;
        vel.x += params.ambient_strength * (phase + pos.y * params.ambient_scale).sin();
        vel.y += params.ambient_strength * (phase + pos.x * params.ambient_scale).cos();
    }

    pos += vel;

    if pos.x < 0.0 || pos.x > ctx.viewport.width {
        vel.x = -vel.x * params.restitution;
        pos.x = pos.x.clamp(0.0, ctx.viewport.width);
    }
    if pos.y < 0.0 || pos.y > ctx.viewport.height {
        vel.y = -vel.y * params.restitution;
        pos.y = pos.y.clamp(0.0, ctx.viewport.height);
    }

    Particle {
        pos,
        vel: vel * params.damping,
        ..*particle
    }
}

/// Owns the particle set, the cursor and the sparkle trail for one surface.
pub struct ParticleField {
    config: FieldConfig,
    store: StoreParams,
    step: StepParams,
    graph_params: GraphParams,
    graph: GraphBuilder,
    viewport: Option<Viewport>,
    particles: Vec<Particle>,
    edges: Vec<Edge>,
    cursor: Option<Vec2>,
    /// Oldest first; every sparkle fades at the same rate.
    sparkles: Vec<Sparkle>,
    time: u64,
    rng: StdRng,
}

impl ParticleField {
    pub fn new(config: FieldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let graph_params = config.graph_params();
        Self {
            store: config.store_params(),
            step: config.step_params(),
            graph: GraphBuilder::new(config.graph, &graph_params),
            graph_params,
            viewport: None,
            particles: Vec::new(),
            edges: Vec::new(),
            cursor: None,
            sparkles: Vec::with_capacity(config::SPARKLE_CAPACITY),
            time: 0,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Replaces the particle set for a new surface size. An invalid size
    /// leaves the field empty and not ready until a valid one arrives.
    pub fn resize(&mut self, viewport: Viewport) {
        self.particles.clear();
        self.edges.clear();
        if !viewport.is_valid() {
            debug!(
                "deferring initialization, viewport {}x{} is not usable",
                viewport.width, viewport.height
            );
            self.viewport = None;
            return;
        }
        self.particles = initialize(viewport, &self.store, &mut self.rng);
        self.viewport = Some(viewport);
        info!(
            "initialized {} particles for {:.0}x{:.0}",
            self.particles.len(),
            viewport.width,
            viewport.height
        );
    }

    pub fn is_ready(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Records the raw pointer position in surface coordinates.
    pub fn track_cursor(&mut self, pos: Vec2) {
        self.cursor = Some(pos);
        if self.config.sparkles && self.rng.gen_bool(config::SPARKLE_CHANCE) {
            self.spawn_sparkle(pos);
        }
    }

    pub fn cursor(&self) -> Option<Vec2> {
        self.cursor
    }

    /// One simulation tick. Returns `false` without doing anything while the
    /// field has no usable viewport.
    pub fn tick(&mut self) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        let ctx = StepContext {
            cursor: self.cursor,
            viewport,
            time: self.time as f64,
        };
        for particle in &mut self.particles {
            *particle = step_particle(particle, &ctx, &self.step);
        }
        self.update_sparkles();
        self.graph
            .build(&self.particles, &self.graph_params, &mut self.edges);
        self.time += 1;
        true
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn sparkles(&self) -> &[Sparkle] {
        &self.sparkles
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn stats(&self) -> FieldStats {
        let mean_speed = if self.particles.is_empty() {
            0.0
        } else {
            self.particles.iter().map(|p| p.vel.length()).sum::<f32>()
                / self.particles.len() as f32
        };
        let mean_edge_length = if self.edges.is_empty() {
            0.0
        } else {
            self.edges.iter().map(|e| e.distance).sum::<f32>() / self.edges.len() as f32
        };
        FieldStats {
            particles: self.particles.len(),
            edges: self.edges.len(),
            sparkles: self.sparkles.len(),
            time: self.time,
            mean_speed,
            mean_edge_length,
        }
    }

    fn spawn_sparkle(&mut self, at: Vec2) {
        let half = config::SPARKLE_JITTER / 2.0;
        let sparkle = Sparkle {
            pos: at + Vec2::new(
                self.rng.gen_range(-half..half),
                self.rng.gen_range(-half..half),
            ),
            size: self
                .rng
                .gen_range(config::SPARKLE_SIZE_MIN..config::SPARKLE_SIZE_MAX),
            opacity: 1.0,
        };
        if self.sparkles.len() >= config::SPARKLE_CAPACITY {
            let excess = self.sparkles.len() + 1 - config::SPARKLE_CAPACITY;
            self.sparkles.drain(..excess);
        }
        self.sparkles.push(sparkle);
    }

    fn update_sparkles(&mut self) {
        let fade = config::SPARKLE_FADE_PER_SECOND / config::SIM_HZ;
        for sparkle in &mut self.sparkles {
            sparkle.opacity -= fade;
        }
        self.sparkles.retain(|s| s.opacity > 0.0);
    }
}
