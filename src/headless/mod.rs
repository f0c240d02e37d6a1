use std::thread;

use anyhow::{Context, Result, bail};
use log::{debug, info};

use crate::{
    config::{self, FieldConfig},
    core::ParticleField,
    frame_loop::{CancelToken, FrameLoop, Pacer},
    types::{FieldStats, Viewport},
};

/// Runs the simulation without a terminal. `ticks == 0` runs in real time
/// until Ctrl-C.
pub fn run(config: FieldConfig, viewport: Viewport, ticks: u64) -> Result<FieldStats> {
    if !viewport.is_valid() {
        bail!(
            "headless viewport must be positive, got {}x{}",
            viewport.width,
            viewport.height
        );
    }
    let mut frames = FrameLoop::new();
    let token = frames.start();
    if ticks == 0 {
        let handler_token = token.clone();
        ctrlc::set_handler(move || handler_token.cancel())
            .context("failed to install Ctrl-C handler")?;
    }

    let mut field = ParticleField::new(config);
    field.resize(viewport);
    let stats = simulate(&mut field, &token, ticks);
    frames.stop();

    info!(
        "finished after {} ticks: {} particles, {} edges (mean length {:.1}), mean speed {:.3}",
        stats.time, stats.particles, stats.edges, stats.mean_edge_length, stats.mean_speed
    );
    Ok(stats)
}

fn simulate(field: &mut ParticleField, token: &CancelToken, ticks: u64) -> FieldStats {
    let report_every = config::SIM_HZ as u64;
    let mut pacer = (ticks == 0).then(|| Pacer::new(config::SIM_HZ, config::MAX_TICKS_PER_FRAME));

    while !token.is_cancelled() && (ticks == 0 || field.time() < ticks) {
        let due = match pacer.as_mut() {
            Some(pacer) => pacer.due(),
            None => 1,
        };
        for _ in 0..due {
            if !field.tick() {
                return field.stats();
            }
            if field.time() % report_every == 0 {
                let stats = field.stats();
                debug!(
                    "tick {}: {} edges, mean speed {:.3}",
                    stats.time, stats.edges, stats.mean_speed
                );
            }
        }
        if let Some(pacer) = &pacer {
            thread::sleep(pacer.step());
        }
    }
    field.stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(count: usize) -> FieldConfig {
        FieldConfig {
            particle_count: count,
            seed: Some(21),
            ..FieldConfig::default()
        }
    }

    mod run_fn {
        use super::*;

        #[test]
        fn runs_requested_ticks() {
            let stats = run(seeded(40), Viewport::new(800.0, 600.0), 120).unwrap();
            assert_eq!(stats.time, 120);
            assert_eq!(stats.particles, 40);
        }

        #[test]
        fn rejects_degenerate_viewport() {
            assert!(run(seeded(10), Viewport::new(0.0, 600.0), 10).is_err());
        }

        #[test]
        fn same_seed_same_outcome() {
            let viewport = Viewport::new(640.0, 480.0);
            let a = run(seeded(30), viewport, 50).unwrap();
            let b = run(seeded(30), viewport, 50).unwrap();
            assert_eq!(a.edges, b.edges);
            assert_eq!(a.mean_speed, b.mean_speed);
        }
    }

    mod simulate_fn {
        use super::*;

        #[test]
        fn cancelled_token_stops_immediately() {
            let mut field = ParticleField::new(seeded(10));
            field.resize(Viewport::new(100.0, 100.0));
            let token = CancelToken::new();
            token.cancel();
            let stats = simulate(&mut field, &token, 100);
            assert_eq!(stats.time, 0);
        }

        #[test]
        fn unready_field_stops() {
            let mut field = ParticleField::new(seeded(10));
            let stats = simulate(&mut field, &CancelToken::new(), 100);
            assert_eq!(stats.time, 0);
            assert_eq!(stats.particles, 0);
        }
    }
}
