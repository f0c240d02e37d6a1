//! Proximity graph: one translucent edge per pair of particles closer than
//! the connection distance. Recomputed from scratch every frame.

use serde::Deserialize;

use crate::{
    spatial::SpatialHash,
    types::{Edge, Particle},
};

#[derive(Clone, Copy, Debug)]
pub struct GraphParams {
    pub connection_distance: f32,
    pub max_opacity: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GraphStrategy {
    /// Check every pair; fine for a few hundred particles.
    #[default]
    BruteForce,
    /// Bucket particles in a grid sized to the connection distance.
    Grid,
}

/// Reusable state for building edges frame after frame.
#[derive(Debug)]
pub struct GraphBuilder {
    strategy: GraphStrategy,
    grid: SpatialHash,
    neighbors: Vec<usize>,
}

impl GraphBuilder {
    pub fn new(strategy: GraphStrategy, params: &GraphParams) -> Self {
        Self {
            strategy,
            grid: SpatialHash::new(params.connection_distance),
            neighbors: Vec::new(),
        }
    }

    pub fn build(&mut self, particles: &[Particle], params: &GraphParams, out: &mut Vec<Edge>) {
        match self.strategy {
            GraphStrategy::BruteForce => build_edges(particles, params, out),
            GraphStrategy::Grid => {
                build_edges_indexed(particles, params, &mut self.grid, &mut self.neighbors, out)
            }
        }
    }
}

pub fn build_edges(particles: &[Particle], params: &GraphParams, out: &mut Vec<Edge>) {
    out.clear();
    for (i, a) in particles.iter().enumerate() {
        for (j, b) in particles.iter().enumerate().skip(i + 1) {
            if let Some(edge) = connect(i, a, j, b, params) {
                out.push(edge);
            }
        }
    }
}

/// Same edges, same order as [`build_edges`], visiting only grid neighbours.
/// Rebuilds `grid` if its cell size no longer matches the threshold.
pub fn build_edges_indexed(
    particles: &[Particle],
    params: &GraphParams,
    grid: &mut SpatialHash,
    neighbors: &mut Vec<usize>,
    out: &mut Vec<Edge>,
) {
    out.clear();
    if grid.cell_size() < params.connection_distance {
        *grid = SpatialHash::new(params.connection_distance);
    }
    grid.rebuild(particles.iter().map(|p| p.pos));
    for (i, a) in particles.iter().enumerate() {
        grid.neighbors_after(i, a.pos, neighbors);
        for &j in neighbors.iter() {
            if let Some(edge) = connect(i, a, j, &particles[j], params) {
                out.push(edge);
            }
        }
    }
}

fn connect(i: usize, a: &Particle, j: usize, b: &Particle, params: &GraphParams) -> Option<Edge> {
    let distance = a.pos.distance(b.pos);
    if distance >= params.connection_distance {
        return None;
    }
    let opacity = (1.0 - distance / params.connection_distance) * params.max_opacity;
    Some(Edge {
        a: i,
        b: j,
        distance,
        opacity,
        color: a.color.with_alpha(opacity),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::types::{Rgba, Vec2};

    const PARAMS: GraphParams = GraphParams {
        connection_distance: 100.0,
        max_opacity: 0.2,
    };

    fn particle_at(x: f32, y: f32) -> Particle {
        Particle {
            pos: Vec2::new(x, y),
            vel: Vec2::ZERO,
            radius: 2.0,
            color: Rgba::opaque(155, 135, 245),
            pulse: None,
        }
    }

    fn scattered(count: usize, seed: u64) -> Vec<Particle> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| particle_at(rng.gen_range(0.0..800.0), rng.gen_range(0.0..600.0)))
            .collect()
    }

    mod build_edges_fn {
        use super::*;

        #[test]
        fn coincident_particles_get_max_opacity() {
            let particles = vec![particle_at(50.0, 50.0), particle_at(50.0, 50.0)];
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            assert_eq!(edges.len(), 1);
            assert_eq!(edges[0].opacity, PARAMS.max_opacity);
        }

        #[test]
        fn pair_at_threshold_is_not_connected() {
            let particles = vec![particle_at(0.0, 0.0), particle_at(100.0, 0.0)];
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            assert!(edges.is_empty());
        }

        #[test]
        fn pair_beyond_threshold_is_not_connected() {
            let particles = vec![particle_at(0.0, 0.0), particle_at(300.0, 400.0)];
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            assert!(edges.is_empty());
        }

        #[test]
        fn opacity_falls_off_linearly() {
            let particles = vec![particle_at(0.0, 0.0), particle_at(30.0, 40.0)];
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            assert_eq!(edges.len(), 1);
            assert!((edges[0].distance - 50.0).abs() < 1e-4);
            assert!((edges[0].opacity - 0.1).abs() < 1e-6);
        }

        #[test]
        fn edge_color_is_first_endpoint_with_alpha() {
            let mut particles = vec![particle_at(0.0, 0.0), particle_at(10.0, 0.0)];
            particles[1].color = Rgba::opaque(1, 2, 3);
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            let edge = edges[0];
            assert_eq!((edge.color.r, edge.color.g, edge.color.b), (155, 135, 245));
            assert_eq!(edge.color.a, edge.opacity);
        }

        #[test]
        fn one_edge_per_unordered_pair() {
            let particles = scattered(80, 3);
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            let mut seen = HashSet::new();
            for edge in &edges {
                assert!(edge.a < edge.b);
                assert!(seen.insert((edge.a, edge.b)));
                assert!(!seen.contains(&(edge.b, edge.a)));
            }
        }

        #[test]
        fn clears_previous_output() {
            let mut edges = Vec::new();
            build_edges(&[particle_at(0.0, 0.0), particle_at(1.0, 0.0)], &PARAMS, &mut edges);
            build_edges(&[particle_at(0.0, 0.0)], &PARAMS, &mut edges);
            assert!(edges.is_empty());
        }

        #[test]
        fn does_not_touch_particles() {
            let particles = scattered(20, 9);
            let before = particles.clone();
            let mut edges = Vec::new();
            build_edges(&particles, &PARAMS, &mut edges);
            assert_eq!(particles, before);
        }
    }

    mod build_edges_indexed_fn {
        use super::*;

        #[test]
        fn matches_brute_force() {
            for seed in 0..5 {
                let particles = scattered(150, seed);
                let mut expected = Vec::new();
                build_edges(&particles, &PARAMS, &mut expected);

                let mut grid = SpatialHash::new(PARAMS.connection_distance);
                let mut neighbors = Vec::new();
                let mut actual = Vec::new();
                build_edges_indexed(&particles, &PARAMS, &mut grid, &mut neighbors, &mut actual);
                assert_eq!(actual, expected);
            }
        }

        #[test]
        fn grows_undersized_grid() {
            let particles = vec![particle_at(5.0, 5.0), particle_at(95.0, 5.0)];
            let mut grid = SpatialHash::new(10.0);
            let mut neighbors = Vec::new();
            let mut edges = Vec::new();
            build_edges_indexed(&particles, &PARAMS, &mut grid, &mut neighbors, &mut edges);
            assert_eq!(edges.len(), 1);
            assert_eq!(grid.cell_size(), PARAMS.connection_distance);
        }
    }

    mod graph_builder {
        use super::*;

        #[test]
        fn strategies_agree() {
            let particles = scattered(60, 11);
            let mut brute = GraphBuilder::new(GraphStrategy::BruteForce, &PARAMS);
            let mut grid = GraphBuilder::new(GraphStrategy::Grid, &PARAMS);
            let mut a = Vec::new();
            let mut b = Vec::new();
            brute.build(&particles, &PARAMS, &mut a);
            grid.build(&particles, &PARAMS, &mut b);
            assert_eq!(a, b);
        }
    }
}
