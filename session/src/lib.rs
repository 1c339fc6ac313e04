#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session tying the world, its systems and the save slot together.
//!
//! A [`Session`] is the only writer of its [`World`]. Every operation
//! submits one command, then pumps the visibility system until it stops
//! emitting commands, and hands the complete event log back so a view can
//! replay it.

mod config;

pub use config::{ConfigError, GameConfig};

use geocache_core::{CellCoord, CoinId, Command, Direction, Event, GeoPoint};
use geocache_persistence::{self as persistence, KeyValueStore, PersistenceError};
use geocache_system_spawning::SpawnOracle;
use geocache_system_visibility::Visibility;
use geocache_world::{self as world, query, World};

/// Result of a coin transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    /// Whether the world accepted the transaction.
    pub accepted: bool,
    /// Every event produced while applying it.
    pub events: Vec<Event>,
}

/// Single controller owning the world and driving its systems.
#[derive(Debug)]
pub struct Session<S: KeyValueStore> {
    world: World,
    visibility: Visibility,
    oracle: SpawnOracle,
    store: S,
    autosave: bool,
}

impl<S: KeyValueStore> Session<S> {
    /// Creates a session from `config` backed by `store`.
    ///
    /// The world is empty until [`Session::start`] runs.
    pub fn new(config: &GameConfig, store: S) -> Self {
        Self {
            world: World::with_grid(config.grid(), config.start()),
            visibility: Visibility::new(config.visibility()),
            oracle: SpawnOracle::new(config.spawning()),
            store,
            autosave: config.autosave(),
        }
    }

    /// Restores the saved game if there is one, otherwise starts fresh at
    /// the configured start location.
    pub fn start(&mut self) -> Vec<Event> {
        match persistence::load_snapshot(&self.store) {
            Some(snapshot) => {
                log::info!("resuming saved game");
                self.run(Command::RestoreWorld { snapshot })
            }
            None => {
                log::info!("starting a new game");
                self.run(Command::ResetWorld)
            }
        }
    }

    /// Moves the player to an absolute location.
    pub fn move_to(&mut self, to: GeoPoint) -> Vec<Event> {
        let events = self.run(Command::MovePlayer { to });
        self.autosave_if_changed(&events);
        events
    }

    /// Moves the player one cell in `direction`.
    pub fn step(&mut self, direction: Direction) -> Vec<Event> {
        let events = self.run(Command::StepPlayer { direction });
        self.autosave_if_changed(&events);
        events
    }

    /// Takes `coin` from the live cache at `cell`.
    pub fn collect(&mut self, cell: CellCoord, coin: CoinId) -> Outcome {
        let events = self.run(Command::CollectCoin { cell, coin });
        let accepted = events
            .iter()
            .any(|event| matches!(event, Event::CoinCollected { .. }));
        if accepted {
            self.autosave();
        }
        Outcome { accepted, events }
    }

    /// Drops the most recently collected coin into the live cache at `cell`.
    pub fn deposit(&mut self, cell: CellCoord) -> Outcome {
        let events = self.run(Command::DepositCoin { cell });
        let accepted = events
            .iter()
            .any(|event| matches!(event, Event::CoinDeposited { .. }));
        if accepted {
            self.autosave();
        }
        Outcome { accepted, events }
    }

    /// Writes the current state to the store.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        let snapshot = query::snapshot(&self.world);
        persistence::save_snapshot(&mut self.store, &snapshot)?;
        log::info!(
            "game saved: {} cells, {} coins carried",
            snapshot.cells.len(),
            snapshot.inventory.len()
        );
        Ok(())
    }

    /// Replaces the current state with the saved one.
    ///
    /// Returns `None` and leaves the world untouched when nothing valid is
    /// saved.
    pub fn load(&mut self) -> Option<Vec<Event>> {
        let snapshot = persistence::load_snapshot(&self.store)?;
        log::info!("game loaded");
        Some(self.run(Command::RestoreWorld { snapshot }))
    }

    /// Forgets everything and returns the player to the start location.
    pub fn reset(&mut self) -> Vec<Event> {
        if let Err(error) = persistence::clear_snapshot(&mut self.store) {
            log::warn!("could not delete saved game: {error}");
        }
        let events = self.run(Command::ResetWorld);
        log::info!("game reset");
        self.autosave();
        events
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Cells inside the current visibility window.
    pub fn window(&self) -> &[CellCoord] {
        self.visibility.window()
    }

    /// Visibility radius in cells.
    pub fn radius(&self) -> u32 {
        self.visibility.radius()
    }

    /// Storage backing the session.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn run(&mut self, command: Command) -> Vec<Event> {
        let mut journal = Vec::new();
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        loop {
            if events.is_empty() {
                break;
            }

            let mut commands = Vec::new();
            self.visibility.handle(
                &events,
                query::grid(&self.world),
                query::cells(&self.world),
                &self.oracle,
                &mut commands,
            );
            journal.append(&mut events);

            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
        journal
    }

    fn autosave_if_changed(&mut self, events: &[Event]) {
        if !events.is_empty() {
            self.autosave();
        }
    }

    fn autosave(&mut self) {
        if !self.autosave {
            return;
        }
        if let Err(error) = self.save() {
            log::warn!("autosave failed: {error}");
        }
    }
}
