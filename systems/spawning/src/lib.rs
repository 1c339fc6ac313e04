#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn oracle deciding which cells host caches.
//!
//! Every decision is a pure function of the seed and the cell indices, so a
//! cell rolls the same way in every session and on every machine. The world
//! records the decision on discovery and never asks again.

use std::hash::Hasher;

use geocache_core::{CellCoord, SpawnDecision};

/// Seed used when no other seed is configured.
pub const DEFAULT_SEED: u64 = 0x5eed_018e_0bad_cafe;
/// Probability that a discovered cell hosts a cache.
pub const DEFAULT_SPAWN_PROBABILITY: f64 = 0.1;
/// Upper bound of the initial coin count of a cache.
pub const DEFAULT_MAX_COINS: u32 = 10;

const SPAWN_TAG: &[u8] = b"spawn";
const COIN_TAG: &[u8] = b"coins";

/// Configuration parameters required to construct the spawn oracle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    seed: u64,
    probability: f64,
    max_coins: u32,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// The probability is clamped to `[0, 1]` (non-finite values fall back
    /// to the default) and a zero coin bound is raised to one.
    #[must_use]
    pub fn new(seed: u64, probability: f64, max_coins: u32) -> Self {
        let probability = if probability.is_finite() {
            probability.clamp(0.0, 1.0)
        } else {
            DEFAULT_SPAWN_PROBABILITY
        };
        Self {
            seed,
            probability,
            max_coins: max_coins.max(1),
        }
    }

    /// Seed mixed into every roll.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Probability that a cell hosts a cache.
    #[must_use]
    pub const fn probability(&self) -> f64 {
        self.probability
    }

    /// Upper bound of the initial coin count.
    #[must_use]
    pub const fn max_coins(&self) -> u32 {
        self.max_coins
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, DEFAULT_SPAWN_PROBABILITY, DEFAULT_MAX_COINS)
    }
}

/// Pure oracle that decides cache presence and size per cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnOracle {
    config: Config,
}

impl SpawnOracle {
    /// Creates a new oracle using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Configuration the oracle was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Decides whether `cell` hosts a cache.
    #[must_use]
    pub fn should_spawn(&self, cell: CellCoord) -> bool {
        self.roll(cell, SPAWN_TAG) < self.config.probability
    }

    /// Number of coins a cache at `cell` starts with, in
    /// `1..=max_coins`.
    #[must_use]
    pub fn initial_coin_count(&self, cell: CellCoord) -> u32 {
        let max_coins = self.config.max_coins;
        let scaled = (self.roll(cell, COIN_TAG) * f64::from(max_coins)).floor();
        (scaled as u32).saturating_add(1).min(max_coins)
    }

    /// Combines [`SpawnOracle::should_spawn`] and
    /// [`SpawnOracle::initial_coin_count`] into a single decision.
    #[must_use]
    pub fn decide(&self, cell: CellCoord) -> SpawnDecision {
        if self.should_spawn(cell) {
            SpawnDecision::Cache {
                coins: self.initial_coin_count(cell),
            }
        } else {
            SpawnDecision::Empty
        }
    }

    /// Reproducible value in `[0, 1)` derived from the seed, the cell and a
    /// tag distinguishing independent rolls.
    fn roll(&self, cell: CellCoord, tag: &[u8]) -> f64 {
        let mut hasher = FnvHasher::new();
        hasher.write(&self.config.seed.to_le_bytes());
        hasher.write(&cell.i().to_le_bytes());
        hasher.write(&cell.j().to_le_bytes());
        hasher.write(tag);
        let mixed = finalize(hasher.finish());
        (mixed >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// FNV-1a 64-bit hasher; unlike `DefaultHasher` its output is fixed across
/// releases and platforms.
#[derive(Debug)]
struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// SplitMix64 finaliser; spreads FNV's weak low bits across the word.
fn finalize(mut value: u64) -> u64 {
    value ^= value >> 30;
    value = value.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    value ^= value >> 27;
    value = value.wrapping_mul(0x94d0_49bb_1331_11eb);
    value ^ (value >> 31)
}
