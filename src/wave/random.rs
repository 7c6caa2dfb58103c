//! Random shapes and the injectable random source behind them.
//!
//! Every random draw in the engine goes through a [`RandomSource`], so tests
//! can swap in a [`SequenceRandom`] and hosts can pin a seed with
//! [`SeededRandom`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A source of uniform values in `[0.0, 1.0)`.
///
/// Implementations must be safe to share between threads evaluating
/// different notes.
pub trait RandomSource: Send + Sync {
    fn next(&self) -> f64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Deterministic ChaCha8 stream for reproducible batches.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen::<f64>()
    }
}

/// Replays a fixed list of values, cycling when exhausted.
///
/// Values are wrapped into `[0.0, 1.0)`. An empty list always yields 0.0.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: AtomicUsize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}

impl RandomSource for SequenceRandom {
    fn next(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[i % self.values.len()].rem_euclid(1.0)
    }
}

/// Uniform noise in `[-1.0, 1.0]`.
pub fn noise(rng: &dyn RandomSource) -> f64 {
    rng.next() * 2.0 - 1.0
}

/// Uniform value between `min` and `max`.
pub fn uniform(rng: &dyn RandomSource, min: f64, max: f64) -> f64 {
    min + rng.next() * (max - min)
}

/// Pick one of `options` with equal probability. `None` when empty.
pub fn choose(rng: &dyn RandomSource, options: &[f64]) -> Option<f64> {
    if options.is_empty() {
        return None;
    }
    let index = ((rng.next() * options.len() as f64) as usize).min(options.len() - 1);
    Some(options[index])
}
