use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use log::debug;

/// Shared stop flag for one animation loop. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Guarantees at most one live loop per surface: starting a loop cancels the
/// one before it.
#[derive(Debug, Default)]
pub struct FrameLoop {
    active: Option<CancelToken>,
    generation: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) -> CancelToken {
        self.stop();
        self.generation += 1;
        debug!("frame loop #{} started", self.generation);
        let token = CancelToken::new();
        self.active = Some(token.clone());
        token
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.active.take() {
            token.cancel();
            debug!("frame loop #{} stopped", self.generation);
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Converts elapsed wall-clock time into whole fixed-length ticks.
#[derive(Debug)]
pub struct Pacer {
    step: Duration,
    max_ticks: u32,
    accumulator: Duration,
    last: Instant,
}

impl Pacer {
    pub fn new(hz: f32, max_ticks: u32) -> Self {
        Self {
            step: Duration::from_secs_f32(1.0 / hz),
            max_ticks,
            accumulator: Duration::ZERO,
            last: Instant::now(),
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.last = Instant::now();
    }

    pub fn due(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = now - self.last;
        self.last = now;
        self.advance(elapsed)
    }

    fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut ticks = 0;
        while self.accumulator >= self.step && ticks < self.max_ticks {
            self.accumulator -= self.step;
            ticks += 1;
        }
        if ticks == self.max_ticks {
            // drop the backlog after a stall instead of fast-forwarding
            self.accumulator = Duration::ZERO;
        }
        ticks
    }
}
