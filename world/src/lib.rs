#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the geocache game.
//!
//! [`World`] is the single source of truth for the player, their inventory and
//! every discovered cell. Nothing outside this crate mutates it: adapters and
//! systems submit [`Command`] values through [`apply`] and observe the
//! resulting [`Event`] stream, or read state through [`query`].

mod cache;
mod cells;
mod player;

pub use cache::Geocache;
pub use cells::{CellState, CellStore, CellStoreError};
pub use player::PlayerState;

use geocache_core::{
    CellCoord, CellGrid, CollectRejection, Command, DepositRejection, Event, GeoPoint,
    SpawnDecision, WorldSnapshot, DEFAULT_ORIGIN, WELCOME_BANNER,
};

/// Represents the authoritative geocache world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    grid: CellGrid,
    start: GeoPoint,
    player: PlayerState,
    cells: CellStore,
    history: Vec<GeoPoint>,
}

impl World {
    /// Creates a fresh world on the default grid with the player at the
    /// default start location.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grid(CellGrid::default(), DEFAULT_ORIGIN)
    }

    /// Creates a fresh world on `grid` with the player standing at `start`.
    #[must_use]
    pub fn with_grid(grid: CellGrid, start: GeoPoint) -> Self {
        let start = if start.is_finite() {
            start
        } else {
            grid.origin()
        };
        Self {
            banner: WELCOME_BANNER,
            grid,
            start,
            player: PlayerState::at(start),
            cells: CellStore::new(),
            history: vec![start],
        }
    }

    fn reset_state(&mut self) {
        self.player = PlayerState::at(self.start);
        self.cells.clear();
        self.history = vec![self.start];
    }

    fn move_player(&mut self, to: GeoPoint, out_events: &mut Vec<Event>) {
        if !to.is_finite() {
            log::warn!("ignoring move to non-finite location {to}");
            return;
        }
        let from = self.player.location();
        self.player.set_location(to);
        self.history.push(to);
        out_events.push(Event::PlayerMoved { from, to });
    }

    fn discover(&mut self, cell: CellCoord, decision: SpawnDecision, out_events: &mut Vec<Event>) {
        if self.cells.is_discovered(cell) {
            log::debug!("cell {cell} already discovered; keeping its original decision");
            return;
        }

        let state = match decision {
            SpawnDecision::Empty => CellState::empty(),
            SpawnDecision::Cache { coins } => {
                let mut cache = Geocache::create(cell, self.grid.anchor(cell), coins);
                cache.show();
                CellState::live(cache)
            }
        };

        if let Err(error) = self.cells.set(cell, state) {
            log::error!("discovery of {cell} rejected by the cell store: {error}");
            debug_assert!(false, "cell store invariant violated: {error}");
            return;
        }

        let spawned = decision.spawns();
        if spawned {
            log::debug!("cell {cell} spawned a cache");
        }
        out_events.push(Event::CellDiscovered { cell, spawned });
        if spawned {
            out_events.push(Event::CacheShown { cell });
        }
    }

    fn restore(&mut self, snapshot: WorldSnapshot) {
        let location = if snapshot.location.is_finite() {
            snapshot.location
        } else {
            self.start
        };

        let mut cells = CellStore::new();
        for record in snapshot.cells {
            let state = match (record.discovered, record.memento) {
                (false, _) => CellState::undiscovered(),
                (true, Some(memento)) => CellState::dormant(memento),
                (true, None) => CellState::empty(),
            };
            if let Err(error) = cells.set(record.cell, state) {
                log::error!("snapshot repeats cell {}: {error}", record.cell);
                debug_assert!(false, "snapshot violates cell store invariant: {error}");
            }
        }

        self.player = PlayerState::with_inventory(location, snapshot.inventory);
        self.cells = cells;
        self.history = if snapshot.history.is_empty() {
            vec![location]
        } else {
            snapshot.history
        };
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { grid, start } => {
            world.grid = grid;
            world.start = if start.is_finite() {
                start
            } else {
                grid.origin()
            };
            world.reset_state();
            out_events.push(Event::GridConfigured { grid });
            out_events.push(Event::WorldReset {
                location: world.start,
            });
        }
        Command::MovePlayer { to } => world.move_player(to, out_events),
        Command::StepPlayer { direction } => {
            let (di, dj) = direction.unit_offset();
            let tile = world.grid.tile_degrees();
            let to = world
                .player
                .location()
                .offset(f64::from(di) * tile, f64::from(dj) * tile);
            world.move_player(to, out_events);
        }
        Command::DiscoverCell { cell, decision } => world.discover(cell, decision, out_events),
        Command::RevealCache { cell } => {
            if world.cells.reveal(cell) {
                out_events.push(Event::CacheShown { cell });
            }
        }
        Command::HideCache { cell } => {
            if world.cells.hide(cell) {
                log::debug!("cache at {cell} hidden");
                out_events.push(Event::CacheHidden { cell });
            }
        }
        Command::CollectCoin { cell, coin } => {
            let Some(cache) = world.cells.cache_mut(cell) else {
                out_events.push(Event::CollectRejected {
                    cell,
                    coin,
                    reason: CollectRejection::CacheNotVisible,
                });
                return;
            };
            if cache.collect(&coin) {
                world.player.push_coin(coin.clone());
                out_events.push(Event::CoinCollected { cell, coin });
            } else {
                out_events.push(Event::CollectRejected {
                    cell,
                    coin,
                    reason: CollectRejection::MissingCoin,
                });
            }
        }
        Command::DepositCoin { cell } => {
            let Some(cache) = world.cells.cache_mut(cell) else {
                out_events.push(Event::DepositRejected {
                    cell,
                    reason: DepositRejection::CacheNotVisible,
                });
                return;
            };
            let Some(coin) = world.player.pop_coin() else {
                out_events.push(Event::DepositRejected {
                    cell,
                    reason: DepositRejection::EmptyInventory,
                });
                return;
            };
            if cache.deposit(&coin) {
                out_events.push(Event::CoinDeposited { cell, coin });
            } else {
                world.player.push_coin(coin);
                out_events.push(Event::DepositRejected {
                    cell,
                    reason: DepositRejection::DuplicateCoin,
                });
            }
        }
        Command::ResetWorld => {
            world.reset_state();
            out_events.push(Event::WorldReset {
                location: world.start,
            });
        }
        Command::RestoreWorld { snapshot } => {
            world.restore(snapshot);
            out_events.push(Event::WorldRestored {
                location: world.player.location(),
            });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use geocache_core::{CellCoord, CellGrid, CellRecord, CoinId, GeoPoint, WorldSnapshot};

    use super::{CellState, CellStore, Geocache, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the world's cell grid.
    #[must_use]
    pub fn grid(world: &World) -> &CellGrid {
        &world.grid
    }

    /// Location fresh and reset games start from.
    #[must_use]
    pub fn start_location(world: &World) -> GeoPoint {
        world.start
    }

    /// Current player location.
    #[must_use]
    pub fn player_location(world: &World) -> GeoPoint {
        world.player.location()
    }

    /// Cell currently occupied by the player.
    #[must_use]
    pub fn player_cell(world: &World) -> CellCoord {
        world.grid.cell_at(world.player.location())
    }

    /// Coins held by the player, oldest first.
    #[must_use]
    pub fn inventory(world: &World) -> &[CoinId] {
        world.player.inventory()
    }

    /// Every location the player has occupied, oldest first.
    #[must_use]
    pub fn movement_history(world: &World) -> &[GeoPoint] {
        &world.history
    }

    /// Read-only view of all cell state, suitable for systems.
    #[must_use]
    pub fn cells(world: &World) -> &CellStore {
        &world.cells
    }

    /// Looks up the state recorded for `cell`.
    #[must_use]
    pub fn cell_state(world: &World, cell: CellCoord) -> Option<&CellState> {
        world.cells.get(cell)
    }

    /// Live cache at `cell`, if it is currently shown.
    #[must_use]
    pub fn cache(world: &World, cell: CellCoord) -> Option<&Geocache> {
        world.cells.get(cell).and_then(CellState::cache)
    }

    /// Cells whose caches are currently shown, in ascending order.
    #[must_use]
    pub fn live_cache_cells(world: &World) -> Vec<CellCoord> {
        world.cells.live_cells().collect()
    }

    /// Number of cells whose spawn decision has been made.
    #[must_use]
    pub fn discovered_count(world: &World) -> usize {
        world.cells.discovered_count()
    }

    /// Captures the complete world as plain data for persistence.
    ///
    /// Live caches contribute their current coins, so edits made since the
    /// last hide are never lost.
    #[must_use]
    pub fn snapshot(world: &World) -> WorldSnapshot {
        let cells = world
            .cells
            .iter()
            .map(|(cell, state)| CellRecord {
                cell,
                discovered: state.is_discovered(),
                memento: state.latest_memento(),
            })
            .collect();

        WorldSnapshot {
            location: world.player.location(),
            inventory: world.player.inventory().to_vec(),
            cells,
            history: world.history.clone(),
        }
    }
}
