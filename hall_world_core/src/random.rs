//! The single source of randomness used by generation.
//!
//! Every random decision (door coins, forced-door choice, cosmetics, ornament
//! placement) goes through [`RandomSource`], so a run is fully determined by
//! the source it was given.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Draws the two kinds of values generation needs.
pub trait RandomSource {
    /// A fair coin flip.
    fn next_bool(&mut self) -> bool;

    /// A uniform index in `0..n`. Callers never pass `n == 0`.
    fn next_index(&mut self, n: usize) -> usize;
}

/// [`RandomSource`] backed by a seeded `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeds from the operating system, for runs that need no reproducibility.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_bool(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    fn next_index(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        self.rng.random_range(0..n)
    }
}

/// Replays a fixed script of draws.
///
/// Coin flips and index draws are consumed from separate queues. Once a queue
/// runs dry it keeps answering `false` / `0`. Index answers are reduced modulo
/// `n`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    bools: VecDeque<bool>,
    indices: VecDeque<usize>,
    bools_drawn: usize,
    indices_drawn: usize,
}

impl ScriptedRandom {
    pub fn new(bools: impl IntoIterator<Item = bool>, indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            bools: bools.into_iter().collect(),
            indices: indices.into_iter().collect(),
            bools_drawn: 0,
            indices_drawn: 0,
        }
    }

    /// A source that always answers `false` / `0`.
    pub fn exhausted() -> Self {
        Self::default()
    }

    pub fn bools_drawn(&self) -> usize {
        self.bools_drawn
    }

    pub fn indices_drawn(&self) -> usize {
        self.indices_drawn
    }
}

impl RandomSource for ScriptedRandom {
    fn next_bool(&mut self) -> bool {
        self.bools_drawn += 1;
        self.bools.pop_front().unwrap_or(false)
    }

    fn next_index(&mut self, n: usize) -> usize {
        self.indices_drawn += 1;
        let value = self.indices.pop_front().unwrap_or(0);
        if n == 0 { 0 } else { value % n }
    }
}
