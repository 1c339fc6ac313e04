#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Visibility scheduler that keeps the caches around the player on screen.
//!
//! Discovery is permanent and decided once per cell; visibility is transient
//! and recomputed on every move. Whenever the player's position changes the
//! system diffs the square window around the player against the world's
//! cell store and emits the commands that bring the world in line:
//! discovering new cells, reviving dormant caches and hiding caches that
//! fell out of range.

use std::collections::BTreeSet;

use geocache_core::{CellCoord, CellGrid, Command, Event, GeoPoint};
use geocache_system_spawning::SpawnOracle;
use geocache_world::CellStore;

/// Number of cells between the player and the edge of the visibility window.
pub const DEFAULT_VISIBILITY_RADIUS: u32 = 8;
/// Largest radius accepted before falling back to the default.
pub const MAX_VISIBILITY_RADIUS: u32 = 64;

/// Configuration parameters required to construct the visibility system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    radius: u32,
}

impl Config {
    /// Creates a new configuration with the provided window radius.
    ///
    /// Radii above [`MAX_VISIBILITY_RADIUS`] fall back to
    /// [`DEFAULT_VISIBILITY_RADIUS`].
    #[must_use]
    pub fn new(radius: u32) -> Self {
        if radius > MAX_VISIBILITY_RADIUS {
            log::warn!(
                "visibility radius {radius} exceeds {MAX_VISIBILITY_RADIUS}; using {DEFAULT_VISIBILITY_RADIUS}"
            );
            return Self::default();
        }
        Self { radius }
    }

    /// Radius of the square window measured in cells.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radius: DEFAULT_VISIBILITY_RADIUS,
        }
    }
}

/// Pure system that turns player movement into discover, reveal and hide
/// commands.
#[derive(Debug)]
pub struct Visibility {
    radius: u32,
    window: Vec<CellCoord>,
}

impl Visibility {
    /// Creates a new visibility system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            radius: config.radius(),
            window: Vec::new(),
        }
    }

    /// Radius of the square window measured in cells.
    #[must_use]
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Cells covered by the most recently computed window, in ascending
    /// order.
    #[must_use]
    pub fn window(&self) -> &[CellCoord] {
        &self.window
    }

    /// Consumes events and immutable views to emit visibility commands.
    ///
    /// Only the last position-changing event in the batch matters. Batches
    /// without one produce no commands, which lets callers pump the system
    /// until it goes quiet.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &CellGrid,
        cells: &CellStore,
        oracle: &SpawnOracle,
        out: &mut Vec<Command>,
    ) {
        let Some(location) = latest_location(events) else {
            return;
        };

        self.window = grid.cells_within(location, self.radius);
        let in_window: BTreeSet<CellCoord> = self.window.iter().copied().collect();

        for &cell in &self.window {
            match cells.get(cell) {
                Some(state) if state.is_discovered() => {
                    if state.is_dormant() {
                        out.push(Command::RevealCache { cell });
                    }
                }
                _ => out.push(Command::DiscoverCell {
                    cell,
                    decision: oracle.decide(cell),
                }),
            }
        }

        for cell in cells.live_cells() {
            if !in_window.contains(&cell) {
                out.push(Command::HideCache { cell });
            }
        }
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn latest_location(events: &[Event]) -> Option<GeoPoint> {
    events.iter().rev().find_map(|event| match event {
        Event::PlayerMoved { to, .. } => Some(*to),
        Event::WorldReset { location } | Event::WorldRestored { location } => Some(*location),
        _ => None,
    })
}
